//! Project inspection: load a file, check its links, run one culling pass.

use anyhow::{Context, Result};
use bw_core::{BlockStore, ProjectFile};
use bw_render::{ContainerSize, CullConfig, CullStats, Viewport, VisibilityEngine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Load a project from JSON, or MessagePack when the extension is `.msgpack`.
pub fn load_project(path: &Path) -> Result<ProjectFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Open {}", path.display()))?;
    let file = if path.extension().is_some_and(|e| e == "msgpack") {
        ProjectFile::from_msgpack(&bytes)
    } else {
        let text = std::str::from_utf8(&bytes)
            .with_context(|| format!("{} is not UTF-8", path.display()))?;
        ProjectFile::from_json_str(text)
    };
    file.with_context(|| format!("Failed to parse {}", path.display()))
}

/// Culling settings from the project's `config.cull`, with an optional
/// margin override.
pub fn cull_config(file: &ProjectFile, margin: Option<f64>) -> Result<CullConfig> {
    let mut config = match file.config.get("cull") {
        Some(v) => CullConfig::deserialize(v).context("Invalid config.cull")?,
        None => CullConfig::default(),
    };
    if let Some(m) = margin {
        config.margin = m;
    }
    Ok(config)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueLine {
    pub block: String,
    pub rule: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub name: String,
    pub version: String,
    pub blocks: usize,
    pub loops: usize,
    pub chains: usize,
    pub block_lists: usize,
    pub issues: Vec<IssueLine>,
    pub viewport: Viewport,
    pub container: ContainerSize,
    pub visible: Vec<String>,
    pub cull: CullStats,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn inspect(
    file: &ProjectFile,
    viewport: Viewport,
    container: ContainerSize,
    config: CullConfig,
) -> Result<Report> {
    let mut store = BlockStore::new();
    let issues = store
        .import_project(file)
        .with_context(|| format!("Project '{}' has invalid blocks", file.name))?;

    let mut engine = VisibilityEngine::new(config);
    let visible = engine
        .calculate_visible_blocks(store.blocks(), &viewport, container)
        .into_iter()
        .map(|b| b.id.to_string())
        .collect();

    // A chain head is a block without a parent.
    let chains = store.blocks().filter(|b| b.parent_id.is_none()).count();

    Ok(Report {
        name: file.name.clone(),
        version: file.version.clone(),
        blocks: store.block_count(),
        loops: store.blocks().filter(|b| b.is_loop()).count(),
        chains,
        block_lists: file.block_lists.len(),
        issues: issues
            .into_iter()
            .map(|i| IssueLine {
                block: i.block.to_string(),
                rule: i.rule,
                message: i.message,
            })
            .collect(),
        viewport,
        container,
        visible,
        cull: engine.performance_stats(),
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project {} (format {})", self.name, self.version)?;
        writeln!(f, "================")?;
        writeln!(f, "{:<16} {}", "blocks", self.blocks)?;
        writeln!(f, "{:<16} {}", "loops", self.loops)?;
        writeln!(f, "{:<16} {}", "chains", self.chains)?;
        writeln!(f, "{:<16} {}", "block lists", self.block_lists)?;
        writeln!(f)?;

        if self.issues.is_empty() {
            writeln!(f, "Links: ok")?;
        } else {
            writeln!(f, "Links: {} issue(s)", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "  {:<24} {:<24} {}", issue.block, issue.rule, issue.message)?;
            }
        }
        writeln!(f)?;

        writeln!(
            f,
            "Viewport ({}, {}) x{} in {}x{}",
            self.viewport.x,
            self.viewport.y,
            self.viewport.zoom,
            self.container.width,
            self.container.height
        )?;
        writeln!(
            f,
            "  visible {} / {} (culled {}, efficiency {:.1}%)",
            self.cull.visible_blocks,
            self.cull.total_blocks,
            self.cull.culled_blocks,
            self.cull.culling_efficiency * 100.0
        )?;
        if let Some(d) = self.cull.last_duration {
            writeln!(f, "  pass took {d:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bw_core::model::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn sample() -> ProjectFile {
        let mut store = BlockStore::new();
        let lp = BlockType::new("t_loop", "forever", BlockKind::Loop);
        let mv = BlockType::new("t_move", "move", BlockKind::Move).with_size(Size::new(100.0, 40.0));
        let a = store.create_block(&lp, None).unwrap();
        let b = store.create_block(&mv, None).unwrap();
        store
            .create_block(&mv, Some(Position::new(9000.0, 9000.0)))
            .unwrap();
        store.connect_blocks(a, b).unwrap();
        store.export_project("sample", "2024-06-01T00:00:00Z")
    }

    const CONTAINER: ContainerSize = ContainerSize::new(800.0, 600.0);

    #[test]
    fn loads_json_and_msgpack() {
        let project = sample();

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json.write_all(project.to_json_string().unwrap().as_bytes())
            .unwrap();
        assert_eq!(load_project(json.path()).unwrap(), project);

        let mut packed = tempfile::Builder::new()
            .suffix(".msgpack")
            .tempfile()
            .unwrap();
        packed.write_all(&project.to_msgpack().unwrap()).unwrap();
        assert_eq!(load_project(packed.path()).unwrap(), project);
    }

    #[test]
    fn garbage_file_is_an_error() {
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(b"{ not json").unwrap();
        let err = load_project(bad.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
    }

    #[test]
    fn report_counts_and_culling() {
        let report = inspect(
            &sample(),
            Viewport::default(),
            CONTAINER,
            CullConfig::default(),
        )
        .unwrap();
        assert_eq!(report.blocks, 3);
        assert_eq!(report.loops, 1);
        // The loop and the far block have no parent.
        assert_eq!(report.chains, 2);
        assert!(report.is_clean());
        assert_eq!(report.cull.total_blocks, 3);
        assert_eq!(report.cull.visible_blocks, 2);

        let text = report.to_string();
        assert!(text.contains("Links: ok"));
        assert!(text.contains("visible 2 / 3"));
    }

    #[test]
    fn broken_links_are_listed() {
        let mut project = sample();
        let loop_id = project.blocks[0].id;
        project.blocks[1].parent_id = None;
        project.blocks[0].loop_first_child_id = Some(loop_id);
        let report = inspect(&project, Viewport::default(), CONTAINER, CullConfig::default()).unwrap();
        assert!(!report.is_clean());
        assert!(report.to_string().contains("issue(s)"));
    }

    #[test]
    fn margin_flag_overrides_project_config() {
        let mut project = sample();
        project.config = serde_json::json!({ "cull": { "margin": 10.0, "track_performance": false } });
        let cfg = cull_config(&project, None).unwrap();
        assert_eq!(cfg.margin, 10.0);
        assert!(!cfg.track_performance);
        assert_eq!(cull_config(&project, Some(0.0)).unwrap().margin, 0.0);
    }
}
