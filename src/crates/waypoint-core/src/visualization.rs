//! Mermaid rendering of compiled graphs
//!
//! ```text
//! graph TD
//!     __start__((START))
//!     __end__((END))
//!     produce["produce"]
//!     review{"review"}
//!     __start__ --> produce
//!     produce --> review
//!     review -. "approve" .-> __end__
//!     review -. "reject" .-> produce
//! ```
//!
//! Conditional routers are drawn as diamonds and finish points as stadiums.
//! Paste the output into any Mermaid renderer, or a ```` ```mermaid ```` block
//! on GitHub.

use crate::graph::{Graph, END};

const START_ID: &str = "__start__";

/// Render `graph` as a Mermaid flowchart
pub fn to_mermaid(graph: &Graph) -> String {
    let mut output = String::from("graph TD\n");

    output.push_str(&format!("    {}((START))\n", START_ID));
    output.push_str(&format!("    style {} fill:#90EE90,stroke:#228B22,stroke-width:2px\n", START_ID));
    output.push_str(&format!("    {}((END))\n", END));
    output.push_str(&format!("    style {} fill:#FFB6C1,stroke:#DC143C,stroke-width:2px\n", END));

    for name in graph.node_names() {
        let id = sanitize_id(name);
        let label = escape_mermaid(name);
        let routed = graph
            .edges_from(name)
            .is_some_and(|edges| edges.conditional.is_some());
        if routed {
            output.push_str(&format!("    {}{{\"{}\"}}\n", id, label));
            output.push_str(&format!("    style {} fill:#FFE4B5,stroke:#FF8C00\n", id));
        } else if graph.is_finish_point(name) {
            output.push_str(&format!("    {}([\"{}\"])\n", id, label));
        } else {
            output.push_str(&format!("    {}[\"{}\"]\n", id, label));
        }
    }

    output.push_str(&format!("    {} --> {}\n", START_ID, sanitize_id(graph.entry())));

    for name in graph.node_names() {
        let from = sanitize_id(name);
        if graph.is_finish_point(name) {
            output.push_str(&format!("    {} --> {}\n", from, END));
            continue;
        }
        let Some(edges) = graph.edges_from(name) else {
            continue;
        };
        if let Some(conditional) = &edges.conditional {
            for (label, target) in &conditional.branches {
                output.push_str(&format!(
                    "    {} -. \"{}\" .-> {}\n",
                    from,
                    escape_mermaid(label),
                    sanitize_id(target)
                ));
            }
        }
        if let Some(target) = &edges.direct {
            // a conditional edge overrides the direct one at run time
            let arrow = if edges.conditional.is_some() { "-.->" } else { "-->" };
            output.push_str(&format!("    {} {} {}\n", from, arrow, sanitize_id(target)));
        }
    }

    output
}

/// Escape special characters for Mermaid labels
fn escape_mermaid(s: &str) -> String {
    s.replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Mermaid ids must be alphanumeric plus underscore
fn sanitize_id(s: &str) -> String {
    if s == END {
        return END.to_string();
    }
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
