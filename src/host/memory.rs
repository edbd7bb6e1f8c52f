//! [`Host`] implementation backed by an in-process document model.
//!
//! [`MemoryHost`] keeps a list of documents (tabs) grouped into windows,
//! tracks which one is active, and models the bits of page state the
//! executor touches: scroll offset, a media element, clickable elements.
//! Every action is logged, so the daemon can run against it as a dry-run
//! host; tests use it to observe effects.

use crate::command::{DocumentId, DocumentInfo, WindowId};
use crate::traits::Host;
use log::info;
use std::cell::RefCell;
use std::collections::HashSet;

/// Errors from the in-memory host.
#[derive(Debug, thiserror::Error)]
pub enum MemoryHostError {
    #[error("no such document: {0}")]
    NoSuchDocument(DocumentId),
}

/// Window every document lands in unless stated otherwise.
pub const MAIN_WINDOW: WindowId = WindowId(1);

#[derive(Debug, Clone)]
struct Document {
    id: DocumentId,
    window: WindowId,
    url: String,
    scroll_y: i64,
    /// `Some(playing)` when the page has a media element.
    media: Option<bool>,
    elements: HashSet<String>,
    clicked: Vec<String>,
    highlighted: Vec<String>,
}

impl Document {
    fn info(&self) -> DocumentInfo {
        DocumentInfo {
            id: self.id,
            window: self.window,
            url: self.url.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    docs: Vec<Document>,
    active: Option<DocumentId>,
}

impl State {
    fn doc(&self, id: DocumentId) -> Result<&Document, MemoryHostError> {
        self.docs
            .iter()
            .find(|d| d.id == id)
            .ok_or(MemoryHostError::NoSuchDocument(id))
    }

    fn doc_mut(&mut self, id: DocumentId) -> Result<&mut Document, MemoryHostError> {
        self.docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(MemoryHostError::NoSuchDocument(id))
    }
}

/// In-process model of a tabbed browser.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: RefCell<State>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    //  Setup and inspection

    /// Open `url` in the main window.
    pub fn open(&self, url: &str, active: bool) -> DocumentId {
        self.open_in(MAIN_WINDOW, url, active)
    }

    /// Open `url` in `window`, appending it to that window's tab strip.
    pub fn open_in(&self, window: WindowId, url: &str, active: bool) -> DocumentId {
        let mut st = self.state.borrow_mut();
        st.next_id += 1;
        let id = DocumentId(st.next_id);
        st.docs.push(Document {
            id,
            window,
            url: url.to_string(),
            scroll_y: 0,
            media: None,
            elements: HashSet::new(),
            clicked: Vec::new(),
            highlighted: Vec::new(),
        });
        if active || st.active.is_none() {
            st.active = Some(id);
        }
        id
    }

    /// Give `id` a media element in the given play state.
    pub fn add_media(&self, id: DocumentId, playing: bool) {
        if let Ok(doc) = self.state.borrow_mut().doc_mut(id) {
            doc.media = Some(playing);
        }
    }

    /// Give `id` an element matching `selector`.
    pub fn add_element(&self, id: DocumentId, selector: &str) {
        if let Ok(doc) = self.state.borrow_mut().doc_mut(id) {
            doc.elements.insert(selector.to_string());
        }
    }

    pub fn document_count(&self) -> usize {
        self.state.borrow().docs.len()
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.state.borrow().active
    }

    pub fn url_of(&self, id: DocumentId) -> Option<String> {
        self.state.borrow().doc(id).ok().map(|d| d.url.clone())
    }

    pub fn scroll_of(&self, id: DocumentId) -> Option<i64> {
        self.state.borrow().doc(id).ok().map(|d| d.scroll_y)
    }

    /// Play state of the media element in `id`, if it has one.
    pub fn is_playing(&self, id: DocumentId) -> Option<bool> {
        self.state.borrow().doc(id).ok().and_then(|d| d.media)
    }

    /// Selectors clicked in `id`, oldest first.
    pub fn clicked(&self, id: DocumentId) -> Vec<String> {
        self.state
            .borrow()
            .doc(id)
            .map(|d| d.clicked.clone())
            .unwrap_or_default()
    }

    /// Selectors highlighted in `id`, oldest first.
    pub fn highlighted(&self, id: DocumentId) -> Vec<String> {
        self.state
            .borrow()
            .doc(id)
            .map(|d| d.highlighted.clone())
            .unwrap_or_default()
    }
}

impl Host for MemoryHost {
    type Error = MemoryHostError;

    fn active_document(&self) -> Result<Option<DocumentInfo>, Self::Error> {
        let st = self.state.borrow();
        Ok(st.active.and_then(|id| st.doc(id).ok()).map(Document::info))
    }

    fn documents_in_window(&self, window: WindowId) -> Result<Vec<DocumentInfo>, Self::Error> {
        Ok(self
            .state
            .borrow()
            .docs
            .iter()
            .filter(|d| d.window == window)
            .map(Document::info)
            .collect())
    }

    fn activate_document(&self, id: DocumentId) -> Result<(), Self::Error> {
        let mut st = self.state.borrow_mut();
        st.doc(id)?;
        st.active = Some(id);
        info!("activate {}", id);
        Ok(())
    }

    fn create_document(&self, url: &str, active: bool) -> Result<DocumentId, Self::Error> {
        let id = self.open(url, active);
        info!("create {} at {} (active: {})", id, url, active);
        Ok(id)
    }

    fn close_document(&self, id: DocumentId) -> Result<(), Self::Error> {
        let mut st = self.state.borrow_mut();
        let pos = st
            .docs
            .iter()
            .position(|d| d.id == id)
            .ok_or(MemoryHostError::NoSuchDocument(id))?;
        let closed = st.docs.remove(pos);
        if st.active == Some(id) {
            // Focus moves to the tab that took its place, else the one
            // before it, within the same window.
            let same_window: Vec<DocumentId> = st
                .docs
                .iter()
                .filter(|d| d.window == closed.window)
                .map(|d| d.id)
                .collect();
            let before = st.docs[..pos]
                .iter()
                .filter(|d| d.window == closed.window)
                .count();
            let next = same_window
                .get(before)
                .or_else(|| same_window.last())
                .copied()
                .or_else(|| st.docs.first().map(|d| d.id));
            st.active = next;
        }
        info!("close {}", id);
        Ok(())
    }

    fn toggle_media(&self, id: DocumentId) -> Result<bool, Self::Error> {
        let mut st = self.state.borrow_mut();
        let doc = st.doc_mut(id)?;
        match doc.media.as_mut() {
            Some(playing) => {
                *playing = !*playing;
                info!("{} media {}", id, if *playing { "playing" } else { "paused" });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn scroll_by(&self, id: DocumentId, dy: i32) -> Result<(), Self::Error> {
        let mut st = self.state.borrow_mut();
        let doc = st.doc_mut(id)?;
        doc.scroll_y = (doc.scroll_y + i64::from(dy)).max(0);
        info!("scroll {} by {} (now at {})", id, dy, doc.scroll_y);
        Ok(())
    }

    fn activate_element(
        &self,
        id: DocumentId,
        selector: &str,
        highlight: bool,
    ) -> Result<bool, Self::Error> {
        let mut st = self.state.borrow_mut();
        let doc = st.doc_mut(id)?;
        if !doc.elements.contains(selector) {
            return Ok(false);
        }
        if highlight {
            doc.highlighted.push(selector.to_string());
        }
        doc.clicked.push(selector.to_string());
        info!("click {:?} in {}", selector, id);
        Ok(true)
    }
}
