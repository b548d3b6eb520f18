use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::args::{GlobalArgs, MatchArgs, OutputFormat};
use crate::reportable::Reportable;
use wormslookup::progress::Progress;
use wormslookup::resolver::Resolver;
use wormslookup::results::{ResultRow, ResultSet};

pub fn run(global_args: &GlobalArgs, args: &MatchArgs) -> Result<()> {
    let mut seen = HashSet::new();
    let names: Vec<String> = args
        .names
        .iter()
        .filter(|n| !n.is_empty() && seen.insert(n.as_str()))
        .cloned()
        .collect();

    let client = args.client_args.build_client()?;
    let progress = Progress::new_bar(names.len() as u64, "Looking up names", global_args.use_progress());
    let results = Resolver::new(&client)
        .jobs(args.client_args.num_jobs)
        .request_interval(args.client_args.request_interval())
        .progress(progress.clone())
        .resolve_blocking(&names)
        .context("Failed to initialize async runtime")?;
    progress.finish_with_message(results.summary().to_string());

    let output = args
        .output_args
        .get_writer()
        .context("Failed to get output writer")?;
    MatchReporter(results).report(args.output_args.format, output)
}

struct MatchReporter(ResultSet);

impl Reportable for MatchReporter {
    type Format = OutputFormat;

    fn report<W: std::io::Write>(&self, format: Self::Format, writer: W) -> Result<()> {
        match self.write_format(format, writer) {
            Ok(()) => Ok(()),
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                // Ignore SIGPIPE errors, like those that can come from piping to `head`
                Some(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                _ => Err(e),
            },
        }
    }
}

impl MatchReporter {
    fn write_format<W: std::io::Write>(&self, format: OutputFormat, mut writer: W) -> Result<()> {
        match format {
            OutputFormat::Human => self.human_format(&mut writer)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, self.0.rows())?;
                writeln!(writer)?;
            }
            OutputFormat::Jsonl => {
                for row in self.0.rows() {
                    serde_json::to_writer(&mut writer, row)?;
                    writeln!(writer)?;
                }
            }
            OutputFormat::Csv => self.0.to_table().to_writer(&mut writer, b',')?,
        }
        writer.flush()?;
        Ok(())
    }

    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let mut prev_name = None;
        for row in self.0.rows() {
            let name = row.entered_name();
            if prev_name != Some(name) {
                if prev_name.is_some() {
                    writeln!(writer)?;
                }
                writeln!(writer, "{}", console::style(name).bold())?;
                prev_name = Some(name);
            }
            match row {
                ResultRow::Match(m) => {
                    let r = &m.record;
                    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "?".to_owned());
                    let aphia_id = r.aphia_id.map(|v| v.to_string()).unwrap_or_else(|| "?".to_owned());
                    writeln!(
                        writer,
                        "  {} {} ({}, {}, {}; AphiaID {})",
                        console::style(or_unknown(&r.match_type)).cyan(),
                        or_unknown(&r.scientificname),
                        or_unknown(&r.rank),
                        or_unknown(&r.status),
                        or_unknown(&r.lsid),
                        aphia_id,
                    )?;
                    if r.valid_name.is_some() && r.valid_name != r.scientificname {
                        writeln!(writer, "      valid name: {}", or_unknown(&r.valid_name))?;
                    }
                }
                ResultRow::Error { kind, .. } => {
                    writeln!(writer, "  {}", console::style(kind).red())?;
                }
            }
        }
        Ok(())
    }
}
