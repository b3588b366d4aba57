use super::super::domain::{NoticeLevel, RegionSelection};
use super::super::markup::escape_html;
use super::super::pipeline::{PipelineOutcome, PipelineRun, AWAITING_SELECTION_MESSAGE};
use super::EXPORT_FILE_NAME;
use std::fmt::Write;

/// What the operator page should show.
#[derive(Debug, Clone, Copy)]
pub enum PageState<'a> {
    Run(&'a PipelineRun),
    /// The client list or the boundaries could not be fetched. `regions` lists the
    /// labels of an already loaded client list, empty when none is available.
    Failed {
        message: &'a str,
        regions: &'a [String],
        selection: &'a RegionSelection,
    },
}

const PAGE_STYLE: &str = "body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }\n\
aside { width: 18rem; padding: 1rem; background: #f3f4f6; }\n\
main { flex: 1; padding: 1rem 2rem; }\n\
select { width: 100%; }\n\
.notice { padding: 0.6rem 0.8rem; margin: 0.5rem 0; border-radius: 4px; }\n\
.info { background: #e0f2fe; }\n\
.warning { background: #fef3c7; }\n\
.error { background: #fee2e2; }\n\
iframe { width: 100%; height: 32rem; border: 1px solid #d1d5db; }\n\
.table-wrap { max-height: 300px; overflow-y: auto; }\n\
table { border-collapse: collapse; width: 100%; }\n\
th, td { border-bottom: 1px solid #e5e7eb; padding: 0.3rem 0.5rem; text-align: left; }\n";

/// Full operator page: region picker, notices, embedded map, export link and table.
///
/// `export_href` must already be a valid URL (query string included).
pub fn render_page(title: &str, state: PageState<'_>, export_href: &str) -> String {
    let (regions, selection) = match state {
        PageState::Run(run) => (run.dataset.regions(), &run.selection),
        PageState::Failed {
            regions, selection, ..
        } => (regions.to_vec(), selection),
    };

    let mut html = String::with_capacity(8192);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
    writeln!(html, "<title>{}</title>", escape_html(title)).expect("page title");
    writeln!(html, "<style>\n{PAGE_STYLE}</style>").expect("page style");
    html.push_str("</head>\n<body>\n");

    render_sidebar(&mut html, &regions, selection);

    html.push_str("<main>\n");
    writeln!(html, "<h1>{}</h1>", escape_html(title)).expect("page heading");

    match state {
        PageState::Failed { message, .. } => {
            notice(&mut html, "error", message);
        }
        PageState::Run(run) => {
            for item in &run.notices {
                let class = match item.level {
                    NoticeLevel::Info => "info",
                    NoticeLevel::Warning => "warning",
                };
                notice(&mut html, class, &item.message);
            }

            match &run.outcome {
                PipelineOutcome::AwaitingSelection => {
                    notice(&mut html, "info", AWAITING_SELECTION_MESSAGE);
                }
                PipelineOutcome::Empty(state) => {
                    notice(&mut html, "warning", state.message());
                }
                PipelineOutcome::Ready(view) => {
                    writeln!(
                        html,
                        "<iframe title=\"{}\" srcdoc=\"{}\"></iframe>",
                        escape_html(title),
                        escape_html(view.document.as_str())
                    )
                    .expect("map iframe");
                    writeln!(
                        html,
                        "<p><a href=\"{}\" download=\"{EXPORT_FILE_NAME}\">Download the map</a></p>",
                        escape_html(export_href)
                    )
                    .expect("download link");
                    render_table(&mut html, run);
                }
            }

            writeln!(
                html,
                "<p><small>Client list fetched {} ({} records).</small></p>",
                run.dataset.fetched_at.format("%Y-%m-%d %H:%M UTC"),
                run.dataset.records.len()
            )
            .expect("fetched-at line");
        }
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, regions: &[String], selection: &RegionSelection) {
    html.push_str("<aside>\n<h2>Filter</h2>\n<form method=\"get\" action=\"/\">\n");
    html.push_str("<label for=\"region\">Select one or more regions</label>\n");
    writeln!(
        html,
        "<select id=\"region\" name=\"region\" multiple size=\"{}\">",
        regions.len().clamp(4, 16)
    )
    .expect("region select");
    for region in regions {
        let selected = if selection.contains(region) {
            " selected"
        } else {
            ""
        };
        let escaped = escape_html(region);
        writeln!(html, "<option value=\"{escaped}\"{selected}>{escaped}</option>").expect("region option");
    }
    html.push_str("</select>\n<p><button type=\"submit\">Show map</button></p>\n</form>\n</aside>\n");
}

fn render_table(html: &mut String, run: &PipelineRun) {
    html.push_str("<h2>Client table</h2>\n<div class=\"table-wrap\">\n<table>\n");
    html.push_str(
        "<thead><tr><th>Name</th><th>Address</th><th>Region</th><th>Latitude</th><th>Longitude</th></tr></thead>\n<tbody>\n",
    );
    for row in run.rows() {
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.name),
            escape_html(&row.address),
            escape_html(&row.region),
            row.latitude,
            row.longitude
        )
        .expect("table row");
    }
    html.push_str("</tbody>\n</table>\n</div>\n");
}

fn notice(html: &mut String, class: &str, message: &str) {
    writeln!(
        html,
        "<div class=\"notice {class}\">{}</div>",
        escape_html(message)
    )
    .expect("notice");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_state_shows_the_error_and_keeps_the_form() {
        let selection = RegionSelection::new(["Paris"]);
        let html = render_page(
            "Client map",
            PageState::Failed {
                message: "could not reach https://example.test/clients.csv: timeout",
                regions: &[],
                selection: &selection,
            },
            "/export?region=Paris",
        );

        assert!(html.contains("<div class=\"notice error\">could not reach"));
        assert!(html.contains("<form method=\"get\" action=\"/\">"));
        assert!(!html.contains("<iframe"));
        assert!(!html.contains("<table>"));
        assert!(!html.contains("<option"));
    }

    #[test]
    fn failed_state_keeps_known_regions_selectable() {
        let selection = RegionSelection::new(["Paris"]);
        let regions = vec!["Nord".to_string(), "Paris".to_string()];
        let html = render_page(
            "Client map",
            PageState::Failed {
                message: "invalid boundary GeoJSON: expected value",
                regions: &regions,
                selection: &selection,
            },
            "/export?region=Paris",
        );

        assert!(html.contains("<option value=\"Nord\">Nord</option>"));
        assert!(html.contains("<option value=\"Paris\" selected>Paris</option>"));
        assert!(html.contains("<div class=\"notice error\">invalid boundary GeoJSON"));
    }
}
