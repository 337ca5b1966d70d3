//! `nbsetup stages`: the stage plan and the record kinds of each stage.

use tabled::Tabled;

use nbsetup_core::{RecordKind, Stage};

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Flag")]
    flag: &'static str,
    #[tabled(rename = "Requires")]
    requires: String,
    #[tabled(rename = "Creates (in order)")]
    creates: String,
}

fn flag(stage: Stage) -> &'static str {
    match stage {
        Stage::Organisation => "-o",
        Stage::Devices => "-d",
        Stage::Ipam => "-i",
        Stage::Circuits => "-c",
        Stage::Virtualisation => "-V",
        Stage::Contacts => "-C",
    }
}

fn rows() -> Vec<StageRow> {
    Stage::ALL
        .iter()
        .map(|&stage| StageRow {
            stage: stage.to_string(),
            flag: flag(stage),
            requires: stage.required_sections().join(", "),
            creates: stage
                .kinds()
                .iter()
                .copied()
                .map(RecordKind::label)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

pub fn handle(global: &GlobalOpts) {
    output::print_output(&output::render_table(&rows()), global.quiet);
}
