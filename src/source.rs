//! Source records handed over by the quote and agency-profile subsystems,
//! and the seam that turns them into a `Contract`.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    AgencyInfo, Clause, CommunicationData, Contract, ContractKind, ContractVariant, Insurance,
    LineItem, MoeData, Party, PaymentStage, Phase, Project, Totals,
};

pub const DEFAULT_TVA_RATE: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub reference: String,
    pub date: Date,
    pub client: Party,
    pub project: Project,
    #[serde(default)]
    pub tva_rate: Option<f64>,
    /// Overrides the standard phase list of the contract family when non-empty.
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Overrides the schedule derived from phases when non-empty.
    #[serde(default)]
    pub payment_schedule: Vec<PaymentStage>,
    #[serde(default)]
    pub insurance: Option<Insurance>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
}

fn one() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub label: String,
    #[serde(default = "one")]
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub is_offered: bool,
    #[serde(default)]
    pub is_optional: bool,
}

/// Builds the normalised contract model from raw records. The engine calls
/// it once per render, after the contract family has been resolved.
pub trait ContractBuilder {
    fn build(
        &self,
        kind: ContractKind,
        document: &SourceDocument,
        lines: &[QuoteLine],
        agency: &AgencyInfo,
    ) -> Result<Contract>;
}

fn fold(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .flat_map(|c| -> Vec<char> {
            match c {
                'à' | 'â' | 'ä' => vec!['a'],
                'é' | 'è' | 'ê' | 'ë' => vec!['e'],
                'î' | 'ï' => vec!['i'],
                'ô' | 'ö' => vec!['o'],
                'ù' | 'û' | 'ü' => vec!['u'],
                'ç' => vec!['c'],
                'œ' => vec!['o', 'e'],
                '-' | ' ' | '\'' | '\u{2019}' => vec!['_'],
                c => vec![c],
            }
        })
        .collect()
}

const MOE_CODES: &[&str] = &[
    "moe",
    "architecture",
    "maitrise_oeuvre",
    "maitrise_d_oeuvre",
    "mission_complete",
];
const COMMUNICATION_CODES: &[&str] = &["communication", "com", "agence_com", "agence_communication"];

const MOE_PROJECT_KEYWORDS: &[&str] = &[
    "architecture",
    "construction",
    "renovation",
    "rehabilitation",
    "extension",
    "amenagement",
    "interieur",
    "maison",
    "logement",
    "batiment",
    "surelevation",
];
const COMMUNICATION_PROJECT_KEYWORDS: &[&str] = &[
    "communication",
    "branding",
    "marketing",
    "identite",
    "evenement",
    "campagne",
    "digital",
    "site_web",
    "print",
    "publicite",
];

impl ContractKind {
    pub fn from_code(code: &str) -> Option<ContractKind> {
        let code = fold(code);
        if MOE_CODES.contains(&code.as_str()) {
            Some(ContractKind::Moe)
        } else if COMMUNICATION_CODES.contains(&code.as_str()) {
            Some(ContractKind::Communication)
        } else {
            None
        }
    }

    pub fn from_project_type(project_type: &str) -> Option<ContractKind> {
        let t = fold(project_type);
        if COMMUNICATION_PROJECT_KEYWORDS.iter().any(|k| t.contains(k)) {
            Some(ContractKind::Communication)
        } else if MOE_PROJECT_KEYWORDS.iter().any(|k| t.contains(k)) {
            Some(ContractKind::Moe)
        } else {
            None
        }
    }

    /// Resolve the contract family once, at the boundary. A present code
    /// wins and must be recognised; an absent or blank code falls back to the
    /// project type.
    pub fn resolve(code: Option<&str>, project_type: Option<&str>) -> Result<ContractKind> {
        if let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) {
            return ContractKind::from_code(code)
                .ok_or_else(|| Error::DataShape(format!("unknown contract type code {code:?}")));
        }
        project_type
            .and_then(ContractKind::from_project_type)
            .ok_or_else(|| {
                Error::DataShape(format!(
                    "no contract type code and project type {:?} does not identify a contract family",
                    project_type.unwrap_or("")
                ))
            })
    }
}

fn phase(code: &str, name: &str, percentage: f64) -> Phase {
    Phase {
        code: code.to_string(),
        name: name.to_string(),
        included: true,
        optional: false,
        percentage,
    }
}

/// Standard phase split for each contract family.
pub fn default_phases(kind: ContractKind) -> Vec<Phase> {
    match kind {
        ContractKind::Moe => vec![
            phase("ESQ", "Esquisse", 5.0),
            phase("APS", "Avant-projet sommaire", 10.0),
            phase("APD", "Avant-projet définitif", 15.0),
            phase("PRO", "Études de projet", 20.0),
            phase("ACT", "Assistance pour la passation des contrats de travaux", 7.0),
            phase("VISA", "Visa des études d'exécution", 8.0),
            phase("DET", "Direction de l'exécution des travaux", 30.0),
            phase("AOR", "Assistance aux opérations de réception", 5.0),
        ],
        ContractKind::Communication => vec![
            phase("AUD", "Audit et brief", 10.0),
            phase("STR", "Stratégie", 20.0),
            phase("CRE", "Création", 35.0),
            phase("PROD", "Production", 25.0),
            phase("DIF", "Diffusion et suivi", 10.0),
        ],
    }
}

/// One payment stage per included phase, rescaled so that the stages add up
/// to 100 % of the fee.
pub fn schedule_from_phases(phases: &[Phase]) -> Vec<PaymentStage> {
    let billable: Vec<&Phase> = phases.iter().filter(|p| p.included && !p.optional).collect();
    let sum: f64 = billable.iter().map(|p| p.percentage).sum();
    if sum <= 0.0 {
        return Vec::new();
    }
    billable
        .iter()
        .enumerate()
        .map(|(i, p)| PaymentStage {
            stage: format!("Échéance {}", i + 1),
            phase_code: Some(p.code.clone()),
            description: format!("À la remise de la phase {}", p.name),
            percentage: round_cents(p.percentage * 100.0 / sum),
        })
        .collect()
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn compute_totals(items: &[LineItem], tva_rate: f64) -> Totals {
    let total_ht = round_cents(
        items
            .iter()
            .filter(|i| !i.is_offered && !i.is_optional)
            .map(|i| i.amount_ht)
            .sum(),
    );
    let tva_amount = round_cents(total_ht * tva_rate / 100.0);
    Totals {
        total_ht,
        tva_rate,
        tva_amount,
        total_ttc: round_cents(total_ht + tva_amount),
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::DataShape(format!("{what} is required")));
    }
    Ok(())
}

fn require_finite(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::DataShape(format!("{what} is not a finite number")));
    }
    Ok(())
}

/// Builds contracts straight from the quote: line amounts are
/// `quantity x unit_price`, totals exclude offered and optional lines, and
/// phases and schedule fall back to the family defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultContractBuilder;

impl ContractBuilder for DefaultContractBuilder {
    fn build(
        &self,
        kind: ContractKind,
        document: &SourceDocument,
        lines: &[QuoteLine],
        agency: &AgencyInfo,
    ) -> Result<Contract> {
        require(&document.reference, "contract reference")?;
        require(&document.client.name, "client name")?;
        require(&agency.name, "agency name")?;

        let line_items = lines
            .iter()
            .map(|l| {
                require_finite(l.quantity, "line quantity")?;
                require_finite(l.unit_price, "line unit price")?;
                Ok(LineItem {
                    label: l.label.clone(),
                    quantity: l.quantity,
                    amount_ht: round_cents(l.quantity * l.unit_price),
                    is_offered: l.is_offered,
                    is_optional: l.is_optional,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let tva_rate = document.tva_rate.unwrap_or(DEFAULT_TVA_RATE);
        require_finite(tva_rate, "TVA rate")?;
        let totals = compute_totals(&line_items, tva_rate);

        let phases = if document.phases.is_empty() {
            default_phases(kind)
        } else {
            document.phases.clone()
        };
        if let Some(p) = phases
            .iter()
            .find(|p| !p.percentage.is_finite() || p.percentage < 0.0)
        {
            return Err(Error::DataShape(format!(
                "phase {} has an invalid percentage",
                p.code
            )));
        }
        let payment_schedule = if document.payment_schedule.is_empty() {
            schedule_from_phases(&phases)
        } else {
            document.payment_schedule.clone()
        };

        let provider = Party {
            name: agency.name.clone(),
            address: agency.address.clone(),
            city: agency.city.clone(),
            email: agency.email.clone(),
            phone: agency.phone.clone(),
            siret: agency.siret.clone(),
            representative: None,
        };
        let variant = match kind {
            ContractKind::Moe => ContractVariant::Moe(MoeData {
                owner: document.client.clone(),
                designer: provider,
                project: document.project.clone(),
            }),
            ContractKind::Communication => ContractVariant::Communication(CommunicationData {
                client: document.client.clone(),
                agency: provider,
                project: document.project.clone(),
            }),
        };

        Ok(Contract {
            reference: document.reference.trim().to_string(),
            date: document.date,
            variant,
            phases,
            line_items,
            totals,
            payment_schedule,
            insurance: document.insurance.clone().filter(|i| !i.is_empty()),
            clauses: document.clauses.clone(),
        })
    }
}
