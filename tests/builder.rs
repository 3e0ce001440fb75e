mod common;

use contract_pdf::{
    ContractKind, ContractRenderer, ContractVariant, Error, Phase, QuoteLine, SourceDocument,
};

use common::MapLoader;

fn renderer() -> ContractRenderer<MapLoader> {
    ContractRenderer::new(MapLoader::new())
}

#[test]
fn totals_exclude_offered_and_optional_lines() {
    let contract = renderer()
        .build(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            Some("moe"),
        )
        .unwrap();

    assert_eq!(contract.line_items.len(), 3);
    assert_eq!(contract.line_items[2].amount_ht, 900.0);
    assert_eq!(contract.totals.total_ht, 12_500.0);
    assert_eq!(contract.totals.tva_rate, 20.0);
    assert_eq!(contract.totals.tva_amount, 2_500.0);
    assert_eq!(contract.totals.total_ttc, 15_000.0);
}

#[test]
fn custom_tva_rate_is_applied() {
    let mut document = common::sample_document();
    document.tva_rate = Some(5.5);
    let contract = renderer()
        .build(&document, &common::sample_lines(), &common::sample_agency(), Some("moe"))
        .unwrap();
    assert_eq!(contract.totals.tva_amount, 687.5);
    assert_eq!(contract.totals.total_ttc, 13_187.5);
}

#[test]
fn agency_becomes_the_provider_party() {
    let contract = renderer()
        .build(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            Some("agence_com"),
        )
        .unwrap();
    assert_eq!(contract.variant.kind(), ContractKind::Communication);
    let ContractVariant::Communication(data) = &contract.variant else {
        panic!("expected communication variant");
    };
    assert_eq!(data.agency.name, "Atelier Nord");
    assert_eq!(data.agency.siret.as_deref(), Some("123 456 789 00010"));
    assert_eq!(data.client.name, "Claire Martin");
}

#[test]
fn default_schedule_follows_included_phases() {
    let contract = renderer()
        .build(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            None,
        )
        .unwrap();
    assert_eq!(contract.variant.kind(), ContractKind::Moe);
    assert_eq!(contract.phases.len(), 8);
    assert_eq!(contract.payment_schedule.len(), 8);
    let codes: Vec<_> = contract
        .payment_schedule
        .iter()
        .filter_map(|s| s.phase_code.as_deref())
        .collect();
    assert_eq!(codes, ["ESQ", "APS", "APD", "PRO", "ACT", "VISA", "DET", "AOR"]);
}

#[test]
fn document_phases_override_defaults() {
    let mut document = common::sample_document();
    document.phases = vec![
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
            percentage: 30.0,
        },
        Phase {
            code: "OPC".into(),
            name: "Ordonnancement, pilotage et coordination".into(),
            included: false,
            optional: true,
            percentage: 10.0,
        },
    ];
    let contract = renderer()
        .build(&document, &common::sample_lines(), &common::sample_agency(), Some("moe"))
        .unwrap();
    assert_eq!(contract.phases, document.phases);
    let pct: Vec<f64> = contract.payment_schedule.iter().map(|s| s.percentage).collect();
    assert_eq!(pct, [50.0, 50.0]);
}

#[test]
fn empty_insurance_is_dropped() {
    let mut document = common::sample_document();
    document.insurance = Some(Default::default());
    let contract = renderer()
        .build(&document, &[], &common::sample_agency(), Some("moe"))
        .unwrap();
    assert!(contract.insurance.is_none());
    assert_eq!(contract.totals.total_ht, 0.0);
}

#[test]
fn missing_reference_is_a_data_error() {
    let mut document = common::sample_document();
    document.reference = String::new();
    let err = renderer()
        .build(&document, &[], &common::sample_agency(), Some("moe"))
        .unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
}

#[test]
fn non_finite_amounts_are_rejected() {
    let lines = vec![QuoteLine {
        label: "Forfait".into(),
        quantity: 1.0,
        unit_price: f64::NAN,
        is_offered: false,
        is_optional: false,
    }];
    let err = renderer()
        .build(&common::sample_document(), &lines, &common::sample_agency(), Some("moe"))
        .unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
}

#[test]
fn source_records_deserialize_from_json() {
    let document: SourceDocument = serde_json::from_value(serde_json::json!({
        "reference": "CT-2026-020",
        "date": "2026-10-01",
        "client": { "name": "SCI Les Acacias", "city": "Arras" },
        "project": { "name": "Réhabilitation d'un entrepôt", "project_type": "Réhabilitation" },
        "clauses": [{ "key": "delai_execution", "text": "Six mois." }]
    }))
    .unwrap();
    let lines: Vec<QuoteLine> = serde_json::from_value(serde_json::json!([
        { "label": "Mission complète", "unit_price": 18000.0 },
        { "label": "Maquette", "quantity": 1, "unit_price": 1500.0, "is_optional": true }
    ]))
    .unwrap();

    assert_eq!(lines[0].quantity, 1.0);
    let contract = renderer()
        .build(&document, &lines, &common::sample_agency(), None)
        .unwrap();
    assert_eq!(contract.variant.kind(), ContractKind::Moe);
    assert_eq!(contract.totals.total_ht, 18_000.0);
    assert_eq!(contract.clauses.len(), 1);

    let round: serde_json::Value = serde_json::to_value(&contract).unwrap();
    assert_eq!(round["variant"], "moe");
    assert_eq!(round["date"], "2026-10-01");
}
