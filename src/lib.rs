mod assets;
mod error;
mod fonts;
mod model;
mod options;
pub mod pdf;
mod sink;
mod source;
mod text;

pub use assets::{AssetLoader, FsAssetLoader, ImageCache, RasterImage, decode_image, fit_box};
#[cfg(feature = "http")]
pub use assets::HttpAssetLoader;
pub use error::{AssetError, Error, Result};
pub use fonts::{FontStyle, text_width, text_width_mm};
pub use model::{
    AgencyInfo, Clause, CommunicationData, Contract, ContractKind, ContractVariant, Insurance,
    LineItem, MoeData, Party, PaymentStage, Phase, Project, Totals,
};
pub use options::{PageGeometry, RenderOptions};
pub use sink::{PageSink, Placed, Point, Primitive, RecordingSink, Rgb, TextStyle};
pub use source::{
    ContractBuilder, DEFAULT_TVA_RATE, DefaultContractBuilder, QuoteLine, SourceDocument,
    compute_totals, default_phases, schedule_from_phases,
};
pub use text::{format_amount, format_currency, format_date_long, format_percent, normalize_text};

use std::time::Instant;

/// Entry point of the engine: resolves the contract family, builds the
/// contract, fetches the agency assets, and renders the PDF.
pub struct ContractRenderer<L: AssetLoader, B: ContractBuilder = DefaultContractBuilder> {
    loader: L,
    builder: B,
    options: RenderOptions,
}

impl<L: AssetLoader> ContractRenderer<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            builder: DefaultContractBuilder,
            options: RenderOptions::default(),
        }
    }
}

impl<L: AssetLoader, B: ContractBuilder> ContractRenderer<L, B> {
    pub fn with_builder<B2: ContractBuilder>(self, builder: B2) -> ContractRenderer<L, B2> {
        ContractRenderer {
            loader: self.loader,
            builder,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the contract model without rendering it.
    pub fn build(
        &self,
        document: &SourceDocument,
        lines: &[QuoteLine],
        agency: &AgencyInfo,
        contract_type_code: Option<&str>,
    ) -> Result<Contract> {
        let kind = ContractKind::resolve(
            contract_type_code,
            document.project.project_type.as_deref(),
        )?;
        log::debug!("contract {} resolved as {:?}", document.reference, kind);
        self.builder.build(kind, document, lines, agency)
    }

    /// Fetch the logo, then the signature. A missing or broken asset never
    /// fails the render; the layout falls back to text for it.
    pub async fn load_assets(&self, agency: &AgencyInfo) -> ImageCache {
        let mut images = ImageCache::new();
        for url in [agency.logo(), agency.signature()].into_iter().flatten() {
            images.load(&self.loader, url).await;
        }
        images
    }

    pub async fn render(
        &self,
        document: &SourceDocument,
        lines: &[QuoteLine],
        agency: &AgencyInfo,
        contract_type_code: Option<&str>,
    ) -> Result<Vec<u8>> {
        let t0 = Instant::now();

        let contract = self.build(document, lines, agency, contract_type_code)?;
        let t_build = t0.elapsed();

        let images = self.load_assets(agency).await;
        let t_assets = t0.elapsed();

        let bytes = pdf::render(&contract, agency, &images, &self.options)?;
        let t_total = t0.elapsed();

        log::info!(
            "Timing: build={:.1}ms, assets={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes)",
            t_build.as_secs_f64() * 1000.0,
            (t_assets - t_build).as_secs_f64() * 1000.0,
            (t_total - t_assets).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            bytes.len(),
        );

        Ok(bytes)
    }
}
