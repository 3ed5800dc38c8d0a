use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info;
use vlmd_ingest::InputKind;
use vlmd_model::DictionaryProps;

use vlmd_cli::pipeline::{ConversionResult, ConvertOptions, convert};

use crate::cli::ConvertArgs;
use crate::summary::apply_table_style;

pub fn run_input_types() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Input type", "Description"]);
    apply_table_style(&mut table);
    for kind in InputKind::ALL {
        table.add_row(vec![kind.token(), kind.description()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConversionResult> {
    let options = convert_options(args);
    info!(
        input = %args.input.display(),
        input_type = ?options.input_kind,
        output_dir = ?options.output_dir,
        "starting conversion"
    );
    convert(&args.input, &options)
        .with_context(|| format!("convert {}", args.input.display()))
}

fn convert_options(args: &ConvertArgs) -> ConvertOptions {
    let mut props = DictionaryProps::new();
    if let Some(title) = &args.title {
        props = props.with_title(title.as_str());
    }
    if let Some(description) = &args.description {
        props = props.with_description(description.as_str());
    }
    let mut options = ConvertOptions::new().with_props(props);
    if let Some(input_type) = args.input_type {
        options = options.with_input_kind(input_type.into());
    }
    if let Some(dir) = &args.output_dir {
        options = options.with_output_dir(dir.clone());
    }
    options
}
