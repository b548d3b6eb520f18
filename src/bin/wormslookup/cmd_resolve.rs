use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::args::{GlobalArgs, ResolveArgs};
use crate::prompt;
use wormslookup::join;
use wormslookup::keys::distinct_keys;
use wormslookup::progress::Progress;
use wormslookup::resolver::Resolver;
use wormslookup::table::Table;

pub fn run(global_args: &GlobalArgs, args: &ResolveArgs) -> Result<()> {
    let delimiter = args.delimiter()?;

    let table = Table::from_path(&args.input, delimiter)
        .with_context(|| format!("Failed to read input table {}", args.input.display()))?;
    debug!("Read {} rows with columns {:?} from {}", table.len(), table.headers(), args.input.display());

    let column = prompt::resolve_column(&table, &args.column)?;
    let keys = distinct_keys(&table, &column)?;
    info!("Found {} unique values in column {column:?}: {keys:?}", keys.len());

    let client = args.client_args.build_client()?;
    let progress = Progress::new_bar(keys.len() as u64, "Looking up names", global_args.use_progress());
    let results = Resolver::new(&client)
        .jobs(args.client_args.num_jobs)
        .request_interval(args.client_args.request_interval())
        .progress(progress.clone())
        .resolve_blocking(&keys)
        .context("Failed to initialize async runtime")?;
    let summary = results.summary();
    progress.finish_with_message(summary.to_string());

    let results_path = args.output_args.results_path(&args.input);
    results
        .to_table()
        .to_path(&results_path, delimiter)
        .with_context(|| format!("Failed to write results table {}", results_path.display()))?;
    println!("{summary}");
    println!("Results written to {}", results_path.display());

    if let Some(merge_path) = &args.output_args.merge {
        let join_column = args.output_args.join_column.as_deref().unwrap_or(&column);
        let merged = join::merge(&table, join_column, &results)
            .context("Failed to merge results onto the input table")?;
        merged
            .to_path(merge_path, delimiter)
            .with_context(|| format!("Failed to write merged table {}", merge_path.display()))?;
        println!("Merged results written to {}", merge_path.display());
    }

    Ok(())
}
