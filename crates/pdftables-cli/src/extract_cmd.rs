use pdftables::{
    ExtractOptions, ExtractOutcome, Extractor, HeaderMode, LatticeEngine, RecordOptions,
    TableSettings,
};

use crate::cli::Cli;

pub fn run(cli: &Cli) -> Result<(), i32> {
    let extractor = Extractor::with_engine(LatticeEngine::new(build_settings(cli)))
        .with_options(build_options(cli));
    let outcome = extractor.extract(&cli.file);

    let json = if cli.pretty {
        serde_json::to_string_pretty(&outcome)
    } else {
        serde_json::to_string(&outcome)
    }
    .map_err(|e| {
        eprintln!("Error: failed to serialize output: {e}");
        1
    })?;
    println!("{json}");

    match outcome {
        ExtractOutcome::Tables(_) => Ok(()),
        ExtractOutcome::Failed(_) => Err(1),
    }
}

fn build_settings(cli: &Cli) -> TableSettings {
    TableSettings::default()
        .with_snap_tolerance(cli.snap_tolerance)
        .with_join_tolerance(cli.join_tolerance)
        .with_text_tolerance(cli.text_tolerance)
}

fn build_options(cli: &Cli) -> ExtractOptions {
    ExtractOptions {
        pages: cli.pages.clone().unwrap_or_default(),
        multiple_tables: !cli.single_table,
        records: RecordOptions {
            header: if cli.no_header {
                HeaderMode::None
            } else {
                HeaderMode::FirstRow
            },
            infer_types: cli.infer_types,
        },
    }
}
