//! Built-in asset/threat catalog and start-up seeding

use super::DbError;
use super::repository::CatalogRepository;
use crate::model::{CatalogAsset, CatalogProcess, CatalogThreat, SeedConfig};

/// (asset name, asset description, [(threat name, threat description)])
type AssetTemplate = (&'static str, &'static str, [(&'static str, &'static str); 3]);

const ASSETS: &[AssetTemplate] = &[
    (
        "Website Perusahaan",
        "Website resmi perusahaan untuk informasi produk dan layanan",
        [
            ("Defacement Website", "Website diubah oleh pihak tidak bertanggung jawab"),
            ("DDoS Attack", "Serangan denial of service pada website"),
            ("SQL Injection", "Serangan injeksi SQL pada database website"),
        ],
    ),
    (
        "Sistem POS (Point of Sale)",
        "Sistem kasir untuk transaksi penjualan",
        [
            ("Malware pada POS", "Malware yang menyerang sistem kasir"),
            ("Card Skimming", "Pencurian data kartu kredit/debit"),
            ("Internal Fraud", "Kecurangan internal pada transaksi"),
        ],
    ),
    (
        "Database Pelanggan",
        "Database yang menyimpan informasi pelanggan",
        [
            ("Data Breach", "Kebocoran data pelanggan"),
            ("Ransomware", "Serangan ransomware pada database"),
            ("Unauthorized Access", "Akses tidak sah ke database"),
        ],
    ),
    (
        "Email Perusahaan",
        "Sistem email untuk komunikasi bisnis",
        [
            ("Phishing Attack", "Serangan phishing melalui email"),
            ("Email Spoofing", "Pemalsuan identitas email"),
            ("Malware via Email", "Malware yang disebarkan melalui email"),
        ],
    ),
    (
        "Aplikasi Mobile",
        "Aplikasi mobile untuk layanan pelanggan",
        [
            ("App Store Compromise", "Kompromi pada aplikasi di store"),
            ("Man-in-the-Middle", "Serangan MITM pada komunikasi mobile"),
            ("Reverse Engineering", "Reverse engineering aplikasi"),
        ],
    ),
    (
        "Server Lokal",
        "Server fisik di lokasi perusahaan",
        [
            ("Physical Theft", "Pencurian fisik server"),
            ("Hardware Failure", "Kegagalan hardware server"),
            ("Power Outage", "Pemadaman listrik yang berkepanjangan"),
        ],
    ),
    (
        "Cloud Storage",
        "Penyimpanan cloud untuk dokumen dan data",
        [
            ("Cloud Provider Breach", "Kebocoran data dari penyedia cloud"),
            ("Misconfigured Access", "Konfigurasi akses yang salah"),
            ("Account Takeover", "Pengambilalihan akun cloud"),
        ],
    ),
    (
        "Sistem Inventory",
        "Sistem manajemen stok dan inventori",
        [
            ("Data Manipulation", "Manipulasi data inventori"),
            ("System Downtime", "Sistem inventori tidak dapat diakses"),
            ("Inventory Theft", "Pencurian fisik barang inventori"),
        ],
    ),
    (
        "Social Media Accounts",
        "Akun media sosial untuk pemasaran",
        [
            ("Account Hijacking", "Pembajakan akun media sosial"),
            ("Fake Account", "Akun palsu yang meniru perusahaan"),
            ("Reputation Damage", "Kerusakan reputasi melalui media sosial"),
        ],
    ),
    (
        "Payment Gateway",
        "Gateway pembayaran online",
        [
            ("Payment Fraud", "Penipuan pembayaran online"),
            ("Transaction Interception", "Intersepsi transaksi pembayaran"),
            ("Gateway Compromise", "Kompromi pada gateway pembayaran"),
        ],
    ),
    (
        "WiFi Network",
        "Jaringan WiFi internal perusahaan",
        [
            ("Network Intrusion", "Intrusi ke jaringan WiFi"),
            ("Eavesdropping", "Penyadapan komunikasi WiFi"),
            ("Rogue Access Point", "Access point palsu"),
        ],
    ),
    (
        "Backup System",
        "Sistem backup data dan recovery",
        [
            ("Backup Corruption", "Korupsi data backup"),
            ("Backup Theft", "Pencurian media backup"),
            ("Recovery Failure", "Kegagalan proses recovery"),
        ],
    ),
    (
        "Customer Support System",
        "Sistem layanan pelanggan",
        [
            ("Support System Downtime", "Sistem support tidak dapat diakses"),
            ("Customer Data Leak", "Kebocoran data pelanggan dari support"),
            ("Social Engineering", "Social engineering pada tim support"),
        ],
    ),
    (
        "Financial Records",
        "Catatan keuangan dan akuntansi",
        [
            ("Financial Fraud", "Penipuan keuangan"),
            ("Accounting Manipulation", "Manipulasi catatan akuntansi"),
            ("Tax Evasion", "Penggelapan pajak"),
        ],
    ),
];

const PROCESSES: &[(&str, &str)] = &[
    ("Penjualan", "Proses penjualan produk dan layanan"),
    ("Pemasaran", "Proses pemasaran dan promosi"),
    ("Customer Service", "Proses layanan pelanggan"),
    ("Keuangan", "Proses keuangan dan akuntansi"),
    ("Operasional", "Proses operasional harian"),
    ("IT Support", "Proses dukungan teknologi informasi"),
];

pub fn builtin_assets() -> Vec<CatalogAsset> {
    ASSETS
        .iter()
        .map(|(name, description, threats)| CatalogAsset {
            name: name.to_string(),
            description: Some(description.to_string()),
            threats: threats
                .iter()
                .map(|(name, description)| CatalogThreat {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    business_processes: Vec::new(),
                })
                .collect(),
        })
        .collect()
}

pub fn builtin_processes() -> Vec<CatalogProcess> {
    PROCESSES
        .iter()
        .map(|(name, description)| CatalogProcess {
            name: name.to_string(),
            description: Some(description.to_string()),
        })
        .collect()
}

/// Seed the catalog unless disabled or assets already exist.
/// Returns the number of threats written.
pub async fn seed_catalog(
    repository: &dyn CatalogRepository,
    config: &SeedConfig,
) -> Result<usize, DbError> {
    if !config.enabled {
        tracing::debug!("Catalog seeding disabled");
        return Ok(0);
    }

    let existing = repository.count_assets().await?;
    if existing > 0 {
        tracing::debug!(assets = existing, "Catalog already present, skipping seed");
        return Ok(0);
    }

    let assets = config.assets.clone().unwrap_or_else(builtin_assets);
    let processes = config
        .business_processes
        .clone()
        .unwrap_or_else(builtin_processes);

    let written = repository.insert_catalog(&assets, &processes).await?;
    tracing::info!(assets = assets.len(), threats = written, "Seeded asset catalog");

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryRepository;
    use crate::model::ThreatKind;

    #[test]
    fn test_builtin_catalog_shape() {
        let assets = builtin_assets();
        assert_eq!(assets.len(), 14);
        assert!(assets.iter().all(|a| a.threats.len() == 3));
        assert_eq!(builtin_processes().len(), 6);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let repo = MemoryRepository::new();
        let config = SeedConfig::default();

        let first = seed_catalog(&repo, &config).await.unwrap();
        assert_eq!(first, 42);

        let second = seed_catalog(&repo, &config).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(repo.count_assets().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_seed_resolves_threat_kinds() {
        let repo = MemoryRepository::new();
        seed_catalog(&repo, &SeedConfig::default()).await.unwrap();

        let assets = repo.list_assets().await.unwrap();
        let kind_of = |name: &str| {
            assets
                .iter()
                .flat_map(|a| a.threats.iter())
                .find(|t| t.name == name)
                .map(|t| t.kind)
                .unwrap()
        };

        assert_eq!(kind_of("Ransomware"), ThreatKind::Ransomware);
        assert_eq!(kind_of("Account Takeover"), ThreatKind::AccountTakeover);
        assert_eq!(kind_of("Payment Fraud"), ThreatKind::PaymentFraud);
        // names that are not a known key keep the generic templates
        assert_eq!(kind_of("DDoS Attack"), ThreatKind::Other);
        assert_eq!(kind_of("SQL Injection"), ThreatKind::Other);
    }

    #[tokio::test]
    async fn test_seed_disabled() {
        let repo = MemoryRepository::new();
        let config = SeedConfig {
            enabled: false,
            ..SeedConfig::default()
        };

        assert_eq!(seed_catalog(&repo, &config).await.unwrap(), 0);
        assert_eq!(repo.count_assets().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_custom_catalog_replaces_builtin() {
        let repo = MemoryRepository::new();
        let config = SeedConfig {
            enabled: true,
            assets: Some(vec![CatalogAsset {
                name: "Akun Bank".to_string(),
                description: None,
                threats: vec![CatalogThreat {
                    name: "Phishing".to_string(),
                    description: None,
                    business_processes: vec![],
                }],
            }]),
            business_processes: None,
        };

        assert_eq!(seed_catalog(&repo, &config).await.unwrap(), 1);
        assert_eq!(repo.count_assets().await.unwrap(), 1);
    }
}
