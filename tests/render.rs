mod common;

use contract_pdf::{
    AgencyInfo, Contract, ContractBuilder, ContractKind, ContractRenderer, Error, FsAssetLoader,
    QuoteLine, RecordingSink, RenderOptions, SourceDocument, pdf,
};

use common::{MapLoader, contains_bytes};

fn uncompressed() -> RenderOptions {
    RenderOptions {
        compress: false,
        ..RenderOptions::default()
    }
}

#[tokio::test]
async fn renders_a_pdf_with_both_images() {
    common::init_logging();
    let renderer = ContractRenderer::new(MapLoader::with_agency_assets());
    let bytes = renderer
        .render(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            Some("moe"),
        )
        .await
        .unwrap();

    assert!(bytes.starts_with(b"%PDF"));
    assert!(contains_bytes(&bytes, b"/Im1"));
    assert!(contains_bytes(&bytes, b"/Im2"));
    assert!(contains_bytes(&bytes, b"/SMask"));
    assert!(contains_bytes(&bytes, b"/WinAnsiEncoding"));
}

#[tokio::test]
async fn unreachable_assets_fall_back_to_text() {
    let renderer = ContractRenderer::new(MapLoader::new()).with_options(uncompressed());
    let bytes = renderer
        .render(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            Some("moe"),
        )
        .await
        .unwrap();

    assert!(!contains_bytes(&bytes, b"/XObject"));
    assert!(contains_bytes(&bytes, b"(Atelier Nord)"));
}

#[tokio::test]
async fn undecodable_logo_is_skipped() {
    let loader = MapLoader::new()
        .with(common::LOGO_URL, b"definitely not a png".to_vec())
        .with(common::SIGNATURE_URL, common::png_bytes(300, 150));
    let renderer = ContractRenderer::new(loader);
    let images = renderer.load_assets(&common::sample_agency()).await;
    assert_eq!(images.len(), 1);
    assert!(images.get(common::SIGNATURE_URL).is_some());
}

#[tokio::test]
async fn page_markers_are_written_uncompressed() {
    let renderer = ContractRenderer::new(MapLoader::new()).with_options(uncompressed());
    let bytes = renderer
        .render(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            None,
        )
        .await
        .unwrap();
    assert!(contains_bytes(&bytes, b"(Page 1/"));
    assert!(contains_bytes(&bytes, b"/Count "));
    assert!(contains_bytes(&bytes, b"/Producer (contract-pdf"));
    assert!(contains_bytes(&bytes, b"(Contrat CT-2026-014)"));
}

#[tokio::test]
async fn unknown_contract_code_is_rejected() {
    let renderer = ContractRenderer::new(MapLoader::new());
    let err = renderer
        .render(
            &common::sample_document(),
            &common::sample_lines(),
            &common::sample_agency(),
            Some("bail_commercial"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DataShape(_)), "got {err:?}");
}

#[tokio::test]
async fn unresolvable_project_type_is_rejected() {
    let mut document = common::sample_document();
    document.project.project_type = Some("Divers".into());
    let renderer = ContractRenderer::new(MapLoader::new());
    let err = renderer
        .render(&document, &common::sample_lines(), &common::sample_agency(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
}

#[tokio::test]
async fn missing_agency_name_is_rejected() {
    let agency = AgencyInfo {
        name: "  ".into(),
        ..common::sample_agency()
    };
    let renderer = ContractRenderer::new(MapLoader::new());
    let err = renderer
        .render(&common::sample_document(), &common::sample_lines(), &agency, Some("com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
}

#[tokio::test]
async fn filesystem_loader_reads_relative_paths() {
    let dir = std::env::temp_dir().join(format!("contract-pdf-assets-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("logo.png"), common::png_bytes(120, 60)).unwrap();

    let agency = AgencyInfo {
        logo_url: Some("logo.png".into()),
        signature_url: Some("file://missing.png".into()),
        ..common::sample_agency()
    };
    let renderer = ContractRenderer::new(FsAssetLoader::new(&dir));
    let images = renderer.load_assets(&agency).await;
    assert_eq!(images.len(), 1);
    let logo = images.get("logo.png").unwrap();
    assert_eq!((logo.width, logo.height), (120, 60));

    let bytes = renderer
        .render(&common::sample_document(), &common::sample_lines(), &agency, Some("moe"))
        .await
        .unwrap();
    assert!(contains_bytes(&bytes, b"/Im1"));
    assert!(!contains_bytes(&bytes, b"/Im2"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn padded_asset_urls_are_drawn() {
    let agency = AgencyInfo {
        logo_url: Some(format!("  {}  ", common::LOGO_URL)),
        signature_url: Some(format!("{}\n", common::SIGNATURE_URL)),
        ..common::sample_agency()
    };
    let renderer = ContractRenderer::new(MapLoader::with_agency_assets());
    let images = renderer.load_assets(&agency).await;
    assert_eq!(images.len(), 2);

    let mut sink = RecordingSink::new();
    pdf::render_contract_into(
        &mut sink,
        &common::sample_moe_contract(),
        &agency,
        &images,
        &RenderOptions::default(),
    )
    .unwrap();

    assert_eq!(
        sink.images,
        vec![common::LOGO_URL.to_string(), common::SIGNATURE_URL.to_string()]
    );
    assert_ne!(sink.find_text("Atelier Nord"), Some((0, 20.0)));
}

/// Hands back the same contract whatever the source records say.
struct FixedBuilder {
    contract: Contract,
}

impl ContractBuilder for FixedBuilder {
    fn build(
        &self,
        kind: ContractKind,
        _document: &SourceDocument,
        _lines: &[QuoteLine],
        _agency: &AgencyInfo,
    ) -> contract_pdf::Result<Contract> {
        assert_eq!(kind, ContractKind::Moe);
        Ok(self.contract.clone())
    }
}

#[tokio::test]
async fn injected_builder_supplies_the_rendered_contract() {
    let mut contract = common::three_phase_moe_contract();
    contract.reference = "CT-FIXE-001".into();
    if let contract_pdf::ContractVariant::Moe(data) = &mut contract.variant {
        data.owner.name = "SCI Les Acacias".into();
    }
    let renderer = ContractRenderer::new(MapLoader::new())
        .with_builder(FixedBuilder {
            contract: contract.clone(),
        })
        .with_options(uncompressed());

    let built = renderer
        .build(&common::sample_document(), &[], &common::sample_agency(), Some("moe"))
        .unwrap();
    assert_eq!(built, contract);

    let bytes = renderer
        .render(&common::sample_document(), &[], &common::sample_agency(), Some("moe"))
        .await
        .unwrap();
    assert!(contains_bytes(&bytes, b"(Contrat CT-FIXE-001)"));
    assert!(contains_bytes(&bytes, b"(SCI Les Acacias)"));
    assert!(contains_bytes(&bytes, b"(Suivi de chantier)"));
    assert!(!contains_bytes(&bytes, b"(Claire Martin)"));
    assert!(!contains_bytes(&bytes, b"(Mission de base)"));
}

#[test]
fn unregistered_image_fails_serialisation() {
    use contract_pdf::{PageGeometry, PageSink, Point, Primitive};

    let mut sink = pdf::PdfSink::new(PageGeometry::A4);
    sink.new_page();
    sink.place(
        0,
        Point::new(20.0, 20.0),
        Primitive::Image {
            key: "mem://never-loaded.png".into(),
            width: 10.0,
            height: 10.0,
        },
    );
    let err = sink.finish().unwrap_err();
    assert!(matches!(err, Error::UnknownImage(ref key) if key == "mem://never-loaded.png"));
}
