use crate::domain::model::{Overlay, Profile, ALL_OVERLAYS};
use std::fmt::Write;

fn overlay_title(overlay: Overlay) -> &'static str {
    match overlay {
        Overlay::Activation => "Activation Sequence",
        Overlay::Venus => "Venus Sequence",
        Overlay::Pearl => "Pearl Sequence",
    }
}

/// Plain-text profile summary for the terminal.
pub fn render_summary(profile: &Profile) -> String {
    let mut out = String::new();
    let meta = &profile.meta;

    let _ = writeln!(out, "✨ {}", meta.input.name);
    let _ = writeln!(
        out,
        "   birth  {} UTC ({})",
        meta.utc.birth.format("%Y-%m-%d %H:%M"),
        meta.geocode.timezone
    );
    let _ = writeln!(
        out,
        "   design {} UTC ({})",
        meta.utc.design.format("%Y-%m-%d %H:%M"),
        meta.input.design_mode
    );

    for overlay in ALL_OVERLAYS {
        let _ = writeln!(out, "\n{}", overlay_title(overlay));
        for record in profile.gene_keys.overlay(overlay) {
            let _ = writeln!(
                out,
                "   {:<12} {:<8} {:<7} {}",
                record.sphere,
                record.code(),
                record.mode.name(),
                record.planet
            );
        }
    }

    if let Some(report) = &profile.human_design {
        let centers: Vec<&str> = report.defined_centers.iter().map(|c| c.name()).collect();
        let _ = writeln!(out, "\nBodygraph");
        let _ = writeln!(out, "   type      {}", report.hd_type);
        let _ = writeln!(out, "   strategy  {}", report.strategy);
        let _ = writeln!(out, "   authority {}", report.authority);
        let _ = writeln!(out, "   channels  {}", report.channels.join(", "));
        let _ = writeln!(out, "   centers   {}", centers.join(", "));
    }

    out
}
