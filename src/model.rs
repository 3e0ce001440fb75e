use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// Which contract family a document belongs to. Resolved once from the
/// contract-type code (or the project type) before anything is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Moe,
    Communication,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub representative: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    /// Floor area in square metres.
    #[serde(default)]
    pub surface: Option<f64>,
    /// Works budget (HT) for MOE, campaign budget for communication.
    #[serde(default)]
    pub budget: Option<f64>,
}

/// Architecture contract: owner (MOA) versus design-service party (MOE).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoeData {
    pub owner: Party,
    pub designer: Party,
    pub project: Project,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunicationData {
    pub client: Party,
    pub agency: Party,
    pub project: Project,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ContractVariant {
    Moe(MoeData),
    Communication(CommunicationData),
}

impl ContractVariant {
    pub fn kind(&self) -> ContractKind {
        match self {
            ContractVariant::Moe(_) => ContractKind::Moe,
            ContractVariant::Communication(_) => ContractKind::Communication,
        }
    }

    pub fn project(&self) -> &Project {
        match self {
            ContractVariant::Moe(d) => &d.project,
            ContractVariant::Communication(d) => &d.project,
        }
    }

    /// The party issuing the contract (the agency side).
    pub fn provider(&self) -> &Party {
        match self {
            ContractVariant::Moe(d) => &d.designer,
            ContractVariant::Communication(d) => &d.agency,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub code: String,
    pub name: String,
    pub included: bool,
    #[serde(default)]
    pub optional: bool,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub quantity: f64,
    pub amount_ht: f64,
    #[serde(default)]
    pub is_offered: bool,
    #[serde(default)]
    pub is_optional: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_ht: f64,
    /// Percentage, e.g. 20.0.
    pub tva_rate: f64,
    pub tva_amount: f64,
    pub total_ttc: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentStage {
    pub stage: String,
    #[serde(default)]
    pub phase_code: Option<String>,
    pub description: String,
    pub percentage: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
}

impl Insurance {
    pub fn is_empty(&self) -> bool {
        self.company.as_deref().is_none_or(str::is_empty)
            && self.policy_number.as_deref().is_none_or(str::is_empty)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub key: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub reference: String,
    pub date: Date,
    #[serde(flatten)]
    pub variant: ContractVariant,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub totals: Totals,
    #[serde(default)]
    pub payment_schedule: Vec<PaymentStage>,
    #[serde(default)]
    pub insurance: Option<Insurance>,
    /// Ordered: clauses render in this order.
    #[serde(default)]
    pub clauses: Vec<Clause>,
}

/// Identity of the agency issuing the document, used by the header,
/// signature block and footer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyInfo {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub tva_number: Option<String>,
    #[serde(default)]
    pub rcs: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub signature_url: Option<String>,
}

impl AgencyInfo {
    /// Trimmed logo URL; this is also the key the decoded image is cached under.
    pub fn logo(&self) -> Option<&str> {
        asset_url(&self.logo_url)
    }

    pub fn signature(&self) -> Option<&str> {
        asset_url(&self.signature_url)
    }
}

fn asset_url(url: &Option<String>) -> Option<&str> {
    url.as_deref().map(str::trim).filter(|u| !u.is_empty())
}
