//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// `plain` calls `id_fn` on each item and joins the results with newlines.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                return String::new();
            }
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item. Table mode uses `detail_fn` for a key/value view.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, so piped stdout stays machine-readable.
pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("record types always serialize")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("record types always serialize")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pihole_core::DnsRecord;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Domain")]
        domain: String,
    }

    fn records() -> Vec<DnsRecord> {
        vec![
            DnsRecord::new("a.local", "10.0.0.1"),
            DnsRecord::new("b.local", "10.0.0.2"),
        ]
    }

    #[test]
    fn plain_lists_one_identifier_per_line() {
        let out = render_list(
            &OutputFormat::Plain,
            &records(),
            |r| Row { domain: r.domain.clone() },
            |r| r.domain.clone(),
        );
        assert_eq!(out, "a.local\nb.local");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &records(),
            |r| Row { domain: r.domain.clone() },
            |r| r.domain.clone(),
        );
        assert!(!out.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[1]["ip"], "10.0.0.2");
    }

    #[test]
    fn empty_table_renders_nothing() {
        let out = render_list(
            &OutputFormat::Table,
            &Vec::<DnsRecord>::new(),
            |r| Row { domain: r.domain.clone() },
            |r| r.domain.clone(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn table_includes_headers() {
        let out = render_list(
            &OutputFormat::Table,
            &records(),
            |r| Row { domain: r.domain.clone() },
            |r| r.domain.clone(),
        );
        assert!(out.contains("Domain"));
        assert!(out.contains("b.local"));
    }
}
