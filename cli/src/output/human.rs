//! Human-readable terminal renderer.

use nodefleet_common::Node;
use owo_colors::OwoColorize as _;

use crate::domain::config::{ImageSelector, ResolvedConfig};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the node table.
    pub fn render_nodes(&self, nodes: &[Node]) {
        if self.ctx.quiet {
            return;
        }
        if nodes.is_empty() {
            self.ctx.kv("Nodes:", "none");
            return;
        }

        let rows: Vec<[String; 5]> = nodes.iter().map(node_row).collect();
        let mut widths = [4, 5, 8, 4, 2];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let header = ["NAME", "STATE", "INSTANCE", "ZONE", "IP"]
            .iter()
            .zip(widths)
            .map(|(title, w)| format!("{title:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", header.style(self.ctx.styles.header));

        for (node, row) in nodes.iter().zip(&rows) {
            let state = format!("{:<w$}", row[1], w = widths[1]);
            println!(
                "  {:<w0$}  {}  {:<w2$}  {:<w3$}  {}",
                row[0],
                state.style(self.ctx.styles.node_state(node.state)),
                row[2],
                row[3],
                row[4],
                w0 = widths[0],
                w2 = widths[2],
                w3 = widths[3],
            );
        }
    }

    /// Render a validated adapter profile.
    pub fn render_profile(&self, config: &ResolvedConfig) {
        self.ctx.success(&format!("Profile [{}] is valid", config.profile));
        self.ctx.kv("  Project:", &config.project);
        self.ctx.kv("  Zone:", &format!("{} ({})", config.zone, config.region));
        self.ctx.kv("  Machine type:", &config.machine_type);
        self.ctx.kv("  Image:", &image_display(&config.image));
        self.ctx.kv("  Networks:", &config.networks.len().to_string());
        if !config.accelerators.is_empty() {
            let accelerators = config
                .accelerators
                .iter()
                .map(|a| format!("{}x{}", a.count, a.accelerator_type))
                .collect::<Vec<_>>()
                .join(", ");
            self.ctx.kv("  Accelerators:", &accelerators);
        }
    }

    /// Render an invalid adapter profile. Never suppressed.
    pub fn render_profile_error(&self, profile: &str, error: &anyhow::Error) {
        self.ctx.error(&format!("Profile [{profile}]: {error:#}"));
    }
}

fn node_row(node: &Node) -> [String; 5] {
    let mapping = node.instance.as_ref();
    [
        node.name.clone(),
        node.state.to_string(),
        mapping.map_or_else(|| "-".to_string(), |m| m.instance.clone()),
        mapping
            .and_then(|m| m.zone())
            .unwrap_or("-")
            .to_string(),
        node.boot_ip().unwrap_or("-").to_string(),
    ]
}

fn image_display(image: &ImageSelector) -> String {
    match image {
        ImageSelector::Name { project, name } => match project {
            Some(project) => format!("{project}/{name}"),
            None => name.clone(),
        },
        ImageSelector::Family { project, family } => match project {
            Some(project) => format!("family {project}/{family}"),
            None => format!("family {family}"),
        },
        ImageSelector::Url(url) => url.clone(),
    }
}
