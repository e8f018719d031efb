//! Threat-specific descriptions and recommendations attached to a score

use crate::model::{RiskCategory, ThreatDescription, ThreatKind};

/// Builds the description payload for a scored threat
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreatDescriptionCatalog;

impl ThreatDescriptionCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn describe(
        &self,
        threat_name: &str,
        kind: ThreatKind,
        category: RiskCategory,
    ) -> ThreatDescription {
        let base = base_description(kind)
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "Ancaman \"{}\" adalah risiko keamanan siber yang perlu diperhatikan.",
                    ThreatKind::normalize_name(threat_name)
                )
            });

        ThreatDescription {
            category,
            threat_name: threat_name.to_string(),
            description: format!("{} {}", base, category_description(kind, category)),
            recommendations: recommendations(kind, category)
                .iter()
                .map(|r| r.to_string())
                .collect(),
            priority: category,
            action_required: category == RiskCategory::High,
        }
    }
}

fn base_description(kind: ThreatKind) -> Option<&'static str> {
    let text = match kind {
        ThreatKind::Ddos => {
            "Distributed Denial of Service (DDoS) adalah serangan yang mengganggu ketersediaan layanan dengan membanjiri server dengan traffic berlebihan."
        }
        ThreatKind::Phishing => {
            "Phishing adalah teknik penipuan yang menggunakan komunikasi elektronik untuk mencuri informasi sensitif seperti kata sandi dan data pribadi."
        }
        ThreatKind::Malware => {
            "Malware adalah perangkat lunak berbahaya yang dirancang untuk merusak, mengganggu, atau mendapatkan akses tidak sah ke sistem komputer."
        }
        ThreatKind::Ransomware => {
            "Ransomware adalah jenis malware yang mengenkripsi data korban dan meminta tebusan untuk mengembalikan akses ke data tersebut."
        }
        ThreatKind::BruteForce => {
            "Brute Force adalah metode serangan yang mencoba menebak kata sandi dengan mencoba berbagai kombinasi karakter secara sistematis."
        }
        ThreatKind::AccountTakeover => {
            "Account Takeover (ATO) adalah serangan dimana penyerang mendapatkan kontrol penuh atas akun korban."
        }
        ThreatKind::DataLeakage => {
            "Data Leakage adalah kebocoran informasi sensitif yang tidak disengaja atau disengaja dari sistem internal ke pihak luar."
        }
        ThreatKind::UnauthorizedAccess => {
            "Unauthorized Access adalah akses tidak sah ke sistem, data, atau sumber daya yang seharusnya dibatasi."
        }
        ThreatKind::SocialEngineering => {
            "Social Engineering adalah teknik manipulasi psikologis untuk menipu orang agar memberikan informasi sensitif atau melakukan tindakan yang merugikan."
        }
        ThreatKind::SupplyChainCompromise => {
            "Supply Chain Compromise adalah serangan yang menargetkan vendor atau pihak ketiga untuk mengakses sistem utama."
        }
        ThreatKind::ThirdPartyCompromise => {
            "Third Party Compromise adalah kompromi keamanan yang terjadi melalui vendor atau mitra bisnis."
        }
        ThreatKind::CredentialStuffing => {
            "Credential Stuffing adalah serangan yang menggunakan kombinasi username/password yang bocor untuk mencoba masuk ke berbagai akun."
        }
        ThreatKind::BusinessEmailCompromise => {
            "Business Email Compromise (BEC) adalah serangan yang menargetkan email bisnis untuk melakukan penipuan finansial."
        }
        ThreatKind::PaymentFraud => {
            "Payment Fraud adalah penipuan yang melibatkan transaksi pembayaran palsu atau manipulasi sistem pembayaran."
        }
        ThreatKind::WebInjection => {
            "Web Injection adalah serangan yang menyisipkan kode berbahaya ke dalam aplikasi web."
        }
        ThreatKind::Defacement => {
            "Defacement adalah serangan yang mengubah tampilan website tanpa izin untuk tujuan propaganda atau vandalisme."
        }
        ThreatKind::PrivilegeEscalation => {
            "Privilege Escalation adalah teknik untuk mendapatkan akses yang lebih tinggi dari yang seharusnya dimiliki."
        }
        ThreatKind::ManInTheMiddle => {
            "Man-in-the-Middle Attack adalah serangan yang menyadap komunikasi antara dua pihak tanpa sepengetahuan mereka."
        }
        ThreatKind::BackupTampering => {
            "Backup Tampering adalah manipulasi atau kerusakan pada sistem backup yang dapat mengancam pemulihan data."
        }
        ThreatKind::IncompleteBackup => {
            "Incomplete Backup adalah kondisi dimana backup data tidak lengkap atau tidak dapat diandalkan untuk pemulihan."
        }
        ThreatKind::Other => return None,
    };
    Some(text)
}

fn category_description(kind: ThreatKind, category: RiskCategory) -> &'static str {
    match (category, kind) {
        (RiskCategory::Low, ThreatKind::Ddos) => {
            "Untuk ancaman DDoS dengan risiko rendah, kemungkinan serangan kecil dan dampaknya terbatas."
        }
        (RiskCategory::Low, ThreatKind::Phishing) => {
            "Untuk ancaman Phishing dengan risiko rendah, tingkat keberhasilan serangan rendah dan dampak minimal."
        }
        (RiskCategory::Low, ThreatKind::Malware) => {
            "Untuk ancaman Malware dengan risiko rendah, kemungkinan infeksi kecil dan dampak terbatas."
        }
        (RiskCategory::Low, ThreatKind::BruteForce) => {
            "Untuk ancaman Brute Force dengan risiko rendah, sistem memiliki perlindungan yang memadai."
        }
        (RiskCategory::Low, ThreatKind::DataLeakage) => {
            "Untuk ancaman Data Leakage dengan risiko rendah, data yang terpapar memiliki sensitivitas rendah."
        }
        (RiskCategory::Low, ThreatKind::SupplyChainCompromise) => {
            "Untuk ancaman Supply Chain Compromise dengan risiko rendah, vendor memiliki keamanan yang memadai dan dampak terbatas."
        }
        (RiskCategory::Low, _) => {
            "Berdasarkan penilaian risiko, ancaman ini memiliki tingkat risiko RENDAH."
        }
        (RiskCategory::Medium, ThreatKind::Ddos) => {
            "Untuk ancaman DDoS dengan risiko sedang, kemungkinan serangan moderat dan dapat menyebabkan gangguan layanan."
        }
        (RiskCategory::Medium, ThreatKind::Phishing) => {
            "Untuk ancaman Phishing dengan risiko sedang, tingkat keberhasilan serangan moderat dan dapat menyebabkan kerugian."
        }
        (RiskCategory::Medium, ThreatKind::Malware) => {
            "Untuk ancaman Malware dengan risiko sedang, kemungkinan infeksi moderat dan dapat menyebabkan gangguan operasional."
        }
        (RiskCategory::Medium, ThreatKind::BruteForce) => {
            "Untuk ancaman Brute Force dengan risiko sedang, sistem memiliki perlindungan dasar namun masih rentan."
        }
        (RiskCategory::Medium, ThreatKind::DataLeakage) => {
            "Untuk ancaman Data Leakage dengan risiko sedang, data yang terpapar memiliki sensitivitas sedang."
        }
        (RiskCategory::Medium, ThreatKind::SupplyChainCompromise) => {
            "Untuk ancaman Supply Chain Compromise dengan risiko sedang, vendor memiliki keamanan dasar namun masih rentan terhadap kompromi."
        }
        (RiskCategory::Medium, _) => {
            "Berdasarkan penilaian risiko, ancaman ini memiliki tingkat risiko SEDANG."
        }
        (RiskCategory::High, ThreatKind::Ddos) => {
            "Untuk ancaman DDoS dengan risiko tinggi, kemungkinan serangan besar dan dapat menyebabkan gangguan layanan yang signifikan."
        }
        (RiskCategory::High, ThreatKind::Phishing) => {
            "Untuk ancaman Phishing dengan risiko tinggi, tingkat keberhasilan serangan tinggi dan dapat menyebabkan kerugian besar."
        }
        (RiskCategory::High, ThreatKind::Malware) => {
            "Untuk ancaman Malware dengan risiko tinggi, kemungkinan infeksi besar dan dapat menyebabkan kerusakan sistem."
        }
        (RiskCategory::High, ThreatKind::BruteForce) => {
            "Untuk ancaman Brute Force dengan risiko tinggi, sistem memiliki perlindungan yang lemah dan sangat rentan."
        }
        (RiskCategory::High, ThreatKind::DataLeakage) => {
            "Untuk ancaman Data Leakage dengan risiko tinggi, data yang terpapar memiliki sensitivitas tinggi."
        }
        (RiskCategory::High, ThreatKind::SupplyChainCompromise) => {
            "Untuk ancaman Supply Chain Compromise dengan risiko tinggi, vendor memiliki keamanan yang lemah dan sangat rentan terhadap kompromi yang dapat mengancam sistem utama."
        }
        (RiskCategory::High, _) => {
            "Berdasarkan penilaian risiko, ancaman ini memiliki tingkat risiko TINGGI."
        }
    }
}

fn recommendations(kind: ThreatKind, category: RiskCategory) -> &'static [&'static str] {
    match (category, kind) {
        (RiskCategory::Low, ThreatKind::Ddos) => &[
            "Monitor traffic server",
            "Siapkan backup server",
            "Review konfigurasi server",
        ],
        (RiskCategory::Low, ThreatKind::Phishing) => &[
            "Edukasi karyawan",
            "Filter email mencurigakan",
            "Aktifkan 2FA",
        ],
        (RiskCategory::Low, ThreatKind::Malware) => &[
            "Update antivirus",
            "Scan sistem berkala",
            "Backup data penting",
        ],
        (RiskCategory::Low, ThreatKind::BruteForce) => &[
            "Gunakan password kuat",
            "Aktifkan 2FA",
            "Monitor akses mencurigakan",
        ],
        (RiskCategory::Low, ThreatKind::DataLeakage) => &[
            "Backup data penting",
            "Enkripsi data sensitif",
            "Pantau akses data",
        ],
        (RiskCategory::Low, _) => &[
            "Lakukan monitoring rutin",
            "Pastikan backup berjalan",
            "Update sistem berkala",
        ],
        (RiskCategory::Medium, ThreatKind::Ddos) => &[
            "Implementasikan DDoS protection service",
            "Siapkan multiple server untuk load balancing",
            "Implementasikan traffic analysis dan filtering",
            "Siapkan emergency response plan",
        ],
        (RiskCategory::Medium, ThreatKind::Phishing) => &[
            "Implementasikan advanced email security",
            "Lakukan simulated phishing testing",
            "Implementasikan URL filtering",
            "Siapkan incident response untuk phishing",
        ],
        (RiskCategory::Medium, ThreatKind::Malware) => &[
            "Implementasikan endpoint detection and response (EDR)",
            "Gunakan sandboxing untuk file mencurigakan",
            "Implementasikan network segmentation",
            "Siapkan malware removal procedures",
        ],
        (RiskCategory::Medium, ThreatKind::BruteForce) => &[
            "Implementasikan advanced authentication methods",
            "Gunakan behavioral analysis untuk deteksi anomali",
            "Implementasikan IP whitelisting",
            "Siapkan account recovery procedures",
        ],
        (RiskCategory::Medium, ThreatKind::DataLeakage) => &[
            "Implementasikan data loss prevention (DLP)",
            "Gunakan data masking untuk testing",
            "Implementasikan access controls yang ketat",
            "Siapkan data breach response plan",
        ],
        (RiskCategory::Medium, _) => &[
            "Tingkatkan monitoring dan alerting",
            "Implementasikan additional security controls",
            "Lakukan penetration testing berkala",
            "Siapkan incident response plan",
        ],
        (RiskCategory::High, ThreatKind::Ddos) => &[
            "🚨 URGENT: Deploy enterprise-grade DDoS protection service (Cloudflare/AWS Shield Pro)",
            "Setup multiple data centers dengan load balancer untuk failover",
            "Implementasikan real-time traffic analysis dan anomaly detection",
            "Siapkan emergency communication plan untuk downtime scenarios",
            "Engage dengan profesional IT untuk hardening infrastructure",
            "Setup backup internet connection dari provider berbeda",
            "Monitor network traffic patterns 24/7 dengan automated alerts",
        ],
        (RiskCategory::High, ThreatKind::Phishing) => &[
            "🚨 URGENT: Deploy advanced email security solution (Mimecast/Proofpoint)",
            "MANDATORY security training untuk SEMUA karyawan dengan quiz",
            "Implementasikan DMARC policy dengan rejection untuk unverified senders",
            "Setup SEGERA rapid response team dengan runbook untuk phishing incidents",
            "Deploy URL filtering dan web proxy untuk blocking malicious sites",
            "Implementasikan behavior analytics untuk detect email anomalies",
            "Engage managed security services untuk 24/7 monitoring",
        ],
        (RiskCategory::High, ThreatKind::Malware) => &[
            "🚨 URGENT: Deploy enterprise-grade endpoint protection (EDR/XDR solution)",
            "Setup sandboxing environment untuk testing file mencurigakan",
            "Implementasikan zero-trust network dengan micro-segmentation",
            "Bentuk dedicated malware incident response team",
            "Deploy threat intelligence feeds untuk proactive defense",
            "Implementasikan application control whitelisting",
            "Setup SIEM untuk correlation analysis dan threat hunting",
        ],
        (RiskCategory::High, ThreatKind::BruteForce) => &[
            "🚨 URGENT: WAJIBKAN multi-factor authentication untuk SEMUA akun",
            "Implementasikan biometric authentication atau hardware security keys",
            "Deploy AI-powered behavioral analytics untuk detect anomaly access",
            "Setup IP whitelisting dan geofencing restrictions",
            "Bentuk dedicated account security monitoring team",
            "Implementasikan Identity and Access Management (IAM) solution",
            "Setup automated account lockout dengan incident response workflow",
        ],
        (RiskCategory::High, ThreatKind::DataLeakage) => &[
            "🚨 URGENT: Implementasikan Data Loss Prevention (DLP) enterprise-grade solution",
            "Deploy end-to-end encryption untuk SEMUA data sensitif",
            "Implementasikan data classification dan access controls berbasis role",
            "Bentuk data breach response team dengan legal dan PR representatives",
            "Setup data access monitoring dengan audit trails real-time",
            "Engage cybersecurity consultant untuk data security assessment",
            "Implementasikan data masking dan anonymization untuk testing environments",
            "Setup continuous monitoring dengan automated alerts untuk unusual data access patterns",
        ],
        (RiskCategory::High, _) => &[
            "⚠️ SEGERA LAKUKAN AUDIT KEAMANAN MENYELURUH!",
            "Implementasikan security monitoring 24/7 dengan alerting real-time",
            "Bentuk tim emergency response yang siap siaga",
            "Lakukan penetration testing profesional secepatnya",
            "Engage dengan cybersecurity consultant untuk assessment mendalam",
            "Document semua security incidents untuk compliance",
            "Latih semua staf tentang incident response procedure",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_threat_with_specific_templates() {
        let desc = ThreatDescriptionCatalog::new().describe(
            "DDoS",
            ThreatKind::Ddos,
            RiskCategory::Medium,
        );

        assert_eq!(desc.threat_name, "DDoS");
        assert!(desc.description.starts_with("Distributed Denial of Service"));
        assert!(desc.description.contains("risiko sedang"));
        assert_eq!(desc.recommendations.len(), 4);
        assert_eq!(desc.priority, RiskCategory::Medium);
        assert!(!desc.action_required);
    }

    #[test]
    fn test_known_threat_falls_back_to_default_category_text() {
        let desc = ThreatDescriptionCatalog::new().describe(
            "Ransomware",
            ThreatKind::Ransomware,
            RiskCategory::Low,
        );

        assert!(desc.description.starts_with("Ransomware adalah"));
        assert!(desc.description.ends_with("tingkat risiko RENDAH."));
        assert_eq!(desc.recommendations[0], "Lakukan monitoring rutin");
    }

    #[test]
    fn test_unknown_threat_uses_its_lookup_key() {
        let desc = ThreatDescriptionCatalog::new().describe(
            "Tax Evasion",
            ThreatKind::Other,
            RiskCategory::High,
        );

        assert!(desc.description.starts_with("Ancaman \"tax_evasion\" adalah"));
        assert_eq!(desc.threat_name, "Tax Evasion");
        assert!(desc.action_required);
        assert_eq!(desc.priority, RiskCategory::High);
        assert_eq!(desc.recommendations.len(), 7);
    }

    #[test]
    fn test_serialized_shape() {
        let desc = ThreatDescriptionCatalog::new().describe(
            "Phishing Attack",
            ThreatKind::Phishing,
            RiskCategory::High,
        );

        let value = serde_json::to_value(&desc).unwrap();
        assert_eq!(value["threatName"], "Phishing Attack");
        assert_eq!(value["priority"], "HIGH");
        assert_eq!(value["actionRequired"], true);
        assert!(value["recommendations"].is_array());
    }
}
