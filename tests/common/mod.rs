#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;

use contract_pdf::{
    AgencyInfo, AssetError, AssetLoader, Clause, Contract, ContractKind, ContractVariant,
    ImageCache, Insurance, LineItem, MoeData, Party, Phase, Project, QuoteLine, RecordingSink,
    RenderOptions, SourceDocument, Totals, compute_totals, default_phases, pdf,
    schedule_from_phases,
};
use jiff::civil::{Date, date};

pub const LOGO_URL: &str = "mem://logo.png";
pub const SIGNATURE_URL: &str = "mem://signature.png";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn contract_date() -> Date {
    date(2026, 8, 3)
}

pub fn sample_agency() -> AgencyInfo {
    AgencyInfo {
        name: "Atelier Nord".into(),
        address: Some("12 rue des Tanneurs".into()),
        city: Some("Lille".into()),
        email: Some("contact@ateliernord.fr".into()),
        phone: Some("03 20 00 00 00".into()),
        siret: Some("123 456 789 00010".into()),
        tva_number: Some("FR12123456789".into()),
        rcs: None,
        logo_url: Some(LOGO_URL.into()),
        signature_url: Some(SIGNATURE_URL.into()),
    }
}

pub fn sample_client() -> Party {
    Party {
        name: "Claire Martin".into(),
        address: Some("4 allée des Tilleuls".into()),
        city: Some("Roubaix".into()),
        email: Some("claire.martin@example.org".into()),
        phone: None,
        siret: None,
        representative: None,
    }
}

pub fn sample_project() -> Project {
    Project {
        name: "Extension d'une maison individuelle".into(),
        address: Some("4 allée des Tilleuls".into()),
        city: Some("Roubaix".into()),
        project_type: Some("Extension".into()),
        surface: Some(42.5),
        budget: Some(125_000.0),
    }
}

pub fn sample_lines() -> Vec<QuoteLine> {
    vec![
        QuoteLine {
            label: "Mission de base".into(),
            quantity: 1.0,
            unit_price: 12_500.0,
            is_offered: false,
            is_optional: false,
        },
        QuoteLine {
            label: "Relevé de l'existant".into(),
            quantity: 1.0,
            unit_price: 800.0,
            is_offered: true,
            is_optional: false,
        },
        QuoteLine {
            label: "Perspectives 3D".into(),
            quantity: 2.0,
            unit_price: 450.0,
            is_offered: false,
            is_optional: true,
        },
    ]
}

pub fn sample_document() -> SourceDocument {
    SourceDocument {
        reference: "CT-2026-014".into(),
        date: contract_date(),
        client: sample_client(),
        project: sample_project(),
        tva_rate: None,
        phases: Vec::new(),
        payment_schedule: Vec::new(),
        insurance: Some(Insurance {
            company: Some("MAF Assurances".into()),
            policy_number: Some("POL-778812".into()),
        }),
        clauses: Vec::new(),
    }
}

fn line_item(label: &str, amount: f64) -> LineItem {
    LineItem {
        label: label.into(),
        quantity: 1.0,
        amount_ht: amount,
        is_offered: false,
        is_optional: false,
    }
}

/// MOE contract built by hand, independent of the default builder.
pub fn sample_moe_contract() -> Contract {
    let agency = sample_agency();
    let phases: Vec<Phase> = default_phases(ContractKind::Moe);
    let line_items = vec![line_item("Mission de base", 12_500.0)];
    let totals: Totals = compute_totals(&line_items, 20.0);
    Contract {
        reference: "CT-2026-014".into(),
        date: contract_date(),
        variant: ContractVariant::Moe(MoeData {
            owner: sample_client(),
            designer: Party {
                name: agency.name.clone(),
                city: agency.city.clone(),
                ..Default::default()
            },
            project: sample_project(),
        }),
        payment_schedule: schedule_from_phases(&phases),
        phases,
        line_items,
        totals,
        insurance: None,
        clauses: Vec::new(),
    }
}

/// MOE contract with three phases, two fee lines and no clauses.
pub fn three_phase_moe_contract() -> Contract {
    let mut contract = sample_moe_contract();
    contract.phases = vec![
        Phase {
            code: "ESQ".into(),
            name: "Esquisse".into(),
            included: true,
            optional: false,
            percentage: 20.0,
        },
        Phase {
            code: "APS".into(),
            name: "Avant-projet sommaire".into(),
            included: true,
            optional: false,
            percentage: 30.0,
        },
        Phase {
            code: "DET".into(),
            name: "Direction de l'exécution des travaux".into(),
            included: true,
            optional: false,
            percentage: 50.0,
        },
    ];
    contract.line_items = vec![
        line_item("Conception", 8_000.0),
        line_item("Suivi de chantier", 4_500.0),
    ];
    contract.totals = compute_totals(&contract.line_items, 20.0);
    contract.payment_schedule = schedule_from_phases(&contract.phases);
    contract.clauses = Vec::new();
    contract
}

/// A clause made of `n` one-line numbered paragraphs.
pub fn numbered_clause(key: &str, n: usize) -> Clause {
    let text = (1..=n)
        .map(|i| format!("Ligne {i:03} du présent article."))
        .collect::<Vec<_>>()
        .join("\n");
    Clause {
        key: key.into(),
        text,
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 60, 90, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Serves assets from memory; unknown URLs fail like a 404 would.
#[derive(Clone, Debug, Default)]
pub struct MapLoader {
    assets: HashMap<String, Vec<u8>>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(url.to_string(), bytes);
        self
    }

    pub fn with_agency_assets() -> Self {
        Self::new()
            .with(LOGO_URL, png_bytes(800, 400))
            .with(SIGNATURE_URL, png_bytes(300, 150))
    }
}

impl AssetLoader for MapLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::Fetch {
                url: url.to_string(),
                reason: "not found".into(),
            })
    }
}

/// Lay `contract` out on a recording sink with no images available.
pub fn record(contract: &Contract, agency: &AgencyInfo) -> RecordingSink {
    record_with(contract, agency, &ImageCache::new(), &RenderOptions::default())
}

pub fn record_with(
    contract: &Contract,
    agency: &AgencyInfo,
    images: &ImageCache,
    opts: &RenderOptions,
) -> RecordingSink {
    let mut sink = RecordingSink::new();
    pdf::render_contract_into(&mut sink, contract, agency, images, opts).expect("layout");
    sink
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
