//! Tutorial viewer state machine.
//!
//! Walks a saved tutorial step by step: catalog → tutorial → step →
//! step … → back to the catalog. The host renders [`ViewerView`] and
//! feeds image lookups back in; the viewer never touches the network.

use flow_core::tutorial::{ContentBlock, ImageMeta, Step, StepOption, Tutorial};
use std::collections::HashMap;
use thiserror::Error;

const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("Next step not found: {0}")]
    StepNotFound(String),
    #[error("unknown tutorial {0}")]
    UnknownTutorial(u64),
    #[error("no tutorial is open")]
    NotInTutorial,
    #[error("option {0} does not exist")]
    NoSuchOption(usize),
}

/// Where the viewer currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Catalog,
    /// The open tutorial has no steps.
    EmptyTutorial { tutorial: u64 },
    Step { tutorial: u64, step_id: String },
}

/// Resolution state of an image block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Loaded { url: String, title: String },
    Failed,
}

// ─── View model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockView {
    Text(String),
    Image { id: u64, state: ImageState },
    Video(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub title: String,
    pub blocks: Vec<BlockView>,
    pub options: Vec<StepOption>,
    /// Terminal step: show a Finish button instead of options.
    pub finish: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerView {
    /// Empty `entries` renders "No Tutorials Found".
    Catalog { entries: Vec<CatalogEntry> },
    EmptyTutorial { title: String },
    Step(StepView),
}

// ─── Viewer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TutorialViewer {
    tutorials: Vec<Tutorial>,
    screen: Option<Screen>,
    images: HashMap<u64, ImageState>,
}

impl TutorialViewer {
    pub fn new(tutorials: Vec<Tutorial>) -> Self {
        Self {
            tutorials,
            screen: None,
            images: HashMap::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen.clone().unwrap_or(Screen::Catalog)
    }

    pub fn tutorials(&self) -> &[Tutorial] {
        &self.tutorials
    }

    fn tutorial(&self, id: u64) -> Option<&Tutorial> {
        self.tutorials.iter().find(|t| t.id == id)
    }

    /// Open a tutorial at its first step.
    pub fn open(&mut self, id: u64) -> Result<(), ViewerError> {
        let tutorial = self.tutorial(id).ok_or(ViewerError::UnknownTutorial(id))?;
        let screen = match tutorial.first_step() {
            Some(step) => Screen::Step {
                tutorial: id,
                step_id: step.step_id.clone(),
            },
            None => Screen::EmptyTutorial { tutorial: id },
        };
        log::debug!("open tutorial {id}: {screen:?}");
        self.screen = Some(screen);
        Ok(())
    }

    pub fn back_to_catalog(&mut self) {
        self.screen = None;
    }

    /// The step currently shown, if any.
    pub fn current_step(&self) -> Option<&Step> {
        match self.screen.as_ref()? {
            Screen::Step { tutorial, step_id } => self.tutorial(*tutorial)?.step(step_id),
            _ => None,
        }
    }

    /// Follow an option's destination. An empty destination finishes the
    /// tutorial and returns to the catalog. A destination that names no
    /// step is an error and leaves the current step on screen.
    pub fn follow(&mut self, next_step_id: &str) -> Result<(), ViewerError> {
        let Some(Screen::Step { tutorial, .. }) = self.screen.clone() else {
            return Err(ViewerError::NotInTutorial);
        };
        if next_step_id.is_empty() {
            log::debug!("tutorial {tutorial} finished");
            self.back_to_catalog();
            return Ok(());
        }
        let exists = self
            .tutorial(tutorial)
            .is_some_and(|t| t.step(next_step_id).is_some());
        if !exists {
            log::warn!("tutorial {tutorial}: step {next_step_id:?} not found");
            return Err(ViewerError::StepNotFound(next_step_id.to_string()));
        }
        self.screen = Some(Screen::Step {
            tutorial,
            step_id: next_step_id.to_string(),
        });
        Ok(())
    }

    /// Pick option `index` of the current step.
    pub fn choose(&mut self, index: usize) -> Result<(), ViewerError> {
        let next = self
            .current_step()
            .ok_or(ViewerError::NotInTutorial)?
            .options
            .get(index)
            .ok_or(ViewerError::NoSuchOption(index))?
            .next_step_id
            .clone();
        self.follow(&next)
    }

    /// The Finish button of a terminal step.
    pub fn finish(&mut self) {
        self.back_to_catalog();
    }

    // ─── Images ──────────────────────────────────────────────────────────

    /// Image ids on the current step that have not been requested yet.
    /// They are marked loading; the host fetches them and reports back
    /// through [`TutorialViewer::image_resolved`].
    pub fn take_image_requests(&mut self) -> Vec<u64> {
        let ids: Vec<u64> = match self.current_step() {
            Some(step) => step
                .content
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Image(id) => Some(*id),
                    _ => None,
                })
                .filter(|id| !self.images.contains_key(id))
                .collect(),
            None => Vec::new(),
        };
        for id in &ids {
            self.images.insert(*id, ImageState::Loading);
        }
        ids
    }

    pub fn image_resolved<E: std::fmt::Display>(&mut self, id: u64, result: Result<ImageMeta, E>) {
        let state = match result {
            Ok(meta) => ImageState::Loaded {
                url: meta.url,
                title: meta.title,
            },
            Err(err) => {
                log::warn!("image {id} failed to load: {err}");
                ImageState::Failed
            }
        };
        self.images.insert(id, state);
    }

    pub fn image_state(&self, id: u64) -> ImageState {
        self.images.get(&id).cloned().unwrap_or(ImageState::Loading)
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn view(&self) -> ViewerView {
        match self.screen() {
            Screen::Catalog => ViewerView::Catalog {
                entries: self
                    .tutorials
                    .iter()
                    .map(|t| CatalogEntry {
                        id: t.id,
                        title: t.title.clone(),
                        description: if t.description.is_empty() {
                            NO_DESCRIPTION.to_string()
                        } else {
                            t.description.clone()
                        },
                    })
                    .collect(),
            },
            Screen::EmptyTutorial { tutorial } => ViewerView::EmptyTutorial {
                title: self
                    .tutorial(tutorial)
                    .map(|t| t.title.clone())
                    .unwrap_or_default(),
            },
            Screen::Step { .. } => match self.current_step() {
                Some(step) => ViewerView::Step(self.step_view(step)),
                None => ViewerView::Catalog {
                    entries: Vec::new(),
                },
            },
        }
    }

    fn step_view(&self, step: &Step) -> StepView {
        let blocks = step
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(html) => Some(BlockView::Text(html.clone())),
                ContentBlock::Image(id) => Some(BlockView::Image {
                    id: *id,
                    state: self.image_state(*id),
                }),
                ContentBlock::Video(html) => Some(BlockView::Video(html.clone())),
                ContentBlock::Unsupported { kind, .. } => {
                    log::trace!("skipping {kind} block");
                    None
                }
            })
            .collect();
        StepView {
            title: step.title.clone(),
            blocks,
            options: step.options.clone(),
            finish: step.is_terminal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn viewer() -> TutorialViewer {
        let tutorials: Vec<Tutorial> = serde_json::from_str(
            r#"[
                { "id": 7, "title": "Router", "description": "", "steps": [
                    { "type": "step", "value": { "step_id": "a", "title": "Power", "content": [
                        { "type": "text", "value": "<p>Plug in</p>" },
                        { "type": "image", "value": 31 }
                    ], "options": [
                        { "label": "Works", "next_step_id": "b" },
                        { "label": "Broken", "next_step_id": "zzz" },
                        { "label": "Give up", "next_step_id": "" }
                    ] } },
                    { "type": "step", "value": { "step_id": "b", "title": "Done", "content": [], "options": [] } }
                ] },
                { "id": 8, "title": "Blank", "description": "Nothing here" }
            ]"#,
        )
        .unwrap();
        TutorialViewer::new(tutorials)
    }

    #[test]
    fn catalog_fills_missing_descriptions() {
        let v = viewer();
        let ViewerView::Catalog { entries } = v.view() else {
            panic!("expected catalog");
        };
        assert_eq!(entries[0].description, "No description available.");
        assert_eq!(entries[1].description, "Nothing here");
    }

    #[test]
    fn walk_to_terminal_step() {
        let mut v = viewer();
        v.open(7).unwrap();
        assert_eq!(v.current_step().unwrap().title, "Power");
        v.choose(0).unwrap();
        let ViewerView::Step(view) = v.view() else {
            panic!("expected step");
        };
        assert_eq!(view.title, "Done");
        assert!(view.finish);
        assert!(view.options.is_empty());
        v.finish();
        assert_eq!(v.screen(), Screen::Catalog);
    }

    #[test]
    fn missing_step_keeps_current_screen() {
        let mut v = viewer();
        v.open(7).unwrap();
        let before = v.screen();
        assert_eq!(v.choose(1), Err(ViewerError::StepNotFound("zzz".into())));
        assert_eq!(
            ViewerError::StepNotFound("zzz".into()).to_string(),
            "Next step not found: zzz"
        );
        assert_eq!(v.screen(), before);
        assert_eq!(v.choose(9), Err(ViewerError::NoSuchOption(9)));
    }

    #[test]
    fn empty_destination_finishes() {
        let mut v = viewer();
        v.open(7).unwrap();
        v.choose(2).unwrap();
        assert_eq!(v.screen(), Screen::Catalog);
        assert_eq!(v.follow("b"), Err(ViewerError::NotInTutorial));
    }

    #[test]
    fn tutorial_without_steps_is_empty() {
        let mut v = viewer();
        v.open(8).unwrap();
        assert_eq!(v.view(), ViewerView::EmptyTutorial { title: "Blank".into() });
        assert_eq!(v.open(99), Err(ViewerError::UnknownTutorial(99)));
    }

    #[test]
    fn images_resolve_asynchronously() {
        let mut v = viewer();
        v.open(7).unwrap();
        assert_eq!(v.take_image_requests(), vec![31]);
        assert!(v.take_image_requests().is_empty());

        let ViewerView::Step(view) = v.view() else {
            panic!("expected step");
        };
        assert_eq!(view.blocks[1], BlockView::Image { id: 31, state: ImageState::Loading });

        v.image_resolved::<String>(
            31,
            Ok(ImageMeta {
                title: "Back panel".into(),
                url: "/media/back.png".into(),
            }),
        );
        assert_eq!(
            v.image_state(31),
            ImageState::Loaded {
                url: "/media/back.png".into(),
                title: "Back panel".into()
            }
        );
        v.image_resolved(31, Err("HTTP 404"));
        assert_eq!(v.image_state(31), ImageState::Failed);
    }
}
