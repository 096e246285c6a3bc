use crate::infra::build_resolver;
use clap::Args;
use fieldmap::config::AppConfig;
use fieldmap::error::AppError;
use fieldmap::mapping::{
    apply_transform, FormType, PortalRegistry, TransformContext, TransformName,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// Domain or URL of the registration form
    #[arg(long)]
    pub(crate) domain: String,
    /// File containing the form HTML; only read when no static or cached mapping exists
    #[arg(long)]
    pub(crate) markup: Option<PathBuf>,
    /// Slug recorded with an inferred mapping (defaults to the first domain label)
    #[arg(long)]
    pub(crate) slug: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct TransformArgs {
    /// Transform name, e.g. cnic_dashes or marks_to_percent
    #[arg(long, value_parser = parse_transform_name)]
    pub(crate) name: TransformName,
    /// Raw profile value
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) value: String,
    /// Marks total used by marks_to_percent
    #[arg(long)]
    pub(crate) total: Option<f64>,
}

pub(crate) fn parse_transform_name(raw: &str) -> Result<TransformName, String> {
    TransformName::parse(raw).ok_or_else(|| {
        let known = TransformName::ALL
            .iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown transform '{raw}' (expected one of: {known})")
    })
}

pub(crate) fn run_portals() -> Result<(), AppError> {
    let registry = PortalRegistry::builtin()?;

    println!("Builtin portal registry ({} portals)", registry.len());
    for profile in registry.profiles() {
        let access = match profile.form_type {
            FormType::Direct => "direct",
            FormType::RequiresLoginFirst => "login first",
        };
        let verified = match profile.last_verified {
            Some(date) if profile.verified => format!("verified {date}"),
            Some(date) => format!("reviewed {date}"),
            None => "never reviewed".to_string(),
        };
        println!(
            "  {:<12} {:<20} {:<12} {:>2} fields  {}",
            profile.slug,
            profile.display_name,
            access,
            profile.field_map.len(),
            verified
        );
        println!("  {:<12} domains: {}", "", profile.domains.join(", "));
    }

    Ok(())
}

pub(crate) async fn run_resolve(args: ResolveArgs) -> Result<(), AppError> {
    let ResolveArgs {
        domain,
        markup,
        slug,
    } = args;

    let config = AppConfig::load()?;
    let resolver = build_resolver(&config)?;

    let markup = match markup {
        Some(path) => Some(tokio::fs::read_to_string(path).await?),
        None => None,
    };

    let mapping = resolver
        .resolve(&domain, markup.as_deref(), slug.as_deref())
        .await?;
    println!("{}", serde_json::to_string_pretty(&mapping)?);
    Ok(())
}

pub(crate) fn run_transform(args: TransformArgs) -> Result<(), AppError> {
    println!("{}", transform_value(&args)?);
    Ok(())
}

fn transform_value(args: &TransformArgs) -> Result<String, AppError> {
    let context = args
        .total
        .map(TransformContext::with_total)
        .unwrap_or_default();
    Ok(apply_transform(Some(args.name), &args.value, &context)?)
}
