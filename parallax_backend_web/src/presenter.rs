// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM element management.
//!
//! Mirrors the painted nodes of a [`Scene`] into flat, absolutely positioned
//! children of a container element, applying incremental updates from
//! [`SceneChanges`]. Structural nodes (layers, strips, tile groups) get no
//! element: their transforms are already folded into each tile's world
//! transform.
//!
//! Tiles whose image fails to load are logged and left in place; the layer
//! keeps animating around them.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, Size};
use parallax_core::animator::LoadPriority;
use parallax_core::backend::Presenter;
use parallax_core::scene::{NodeKind, Scene, SceneChanges};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, Event, HtmlElement};

/// Maps the painted nodes of a [`Scene`] to live DOM elements.
///
/// Tiles become `<img>` elements, the backdrop a filled `<div>`, and the
/// foreground slot an empty `<div>` hosts can append their content to.
pub struct DomPresenter {
    container: HtmlElement,
    elements: Vec<Option<HtmlElement>>,
    foreground: Option<u32>,
    on_image_error: Closure<dyn FnMut(Event)>,
}

impl core::fmt::Debug for DomPresenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPresenter")
            .field("container", &"HtmlElement")
            .field("elements_len", &self.elements.len())
            .field("foreground", &self.foreground)
            .finish_non_exhaustive()
    }
}

impl DomPresenter {
    /// Creates a new presenter that manages child elements of `container`.
    ///
    /// The container becomes the positioning and clipping context.
    #[must_use]
    pub fn new(container: HtmlElement) -> Self {
        let s = container.style();
        let _ = s.set_property("position", "relative");
        let _ = s.set_property("overflow", "hidden");
        let on_image_error = Closure::wrap(Box::new(|event: Event| {
            let src = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|el| el.get_attribute("src"));
            log::warn!("{}", image_error_message(src.as_deref()));
        }) as Box<dyn FnMut(Event)>);
        Self {
            container,
            elements: Vec::new(),
            foreground: None,
            on_image_error,
        }
    }

    /// Returns a reference to the container element.
    #[must_use]
    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// Returns the DOM element for the given slot index, if it exists.
    #[must_use]
    pub fn get_element(&self, idx: u32) -> Option<&HtmlElement> {
        self.elements
            .get(idx as usize)
            .and_then(|slot| slot.as_ref())
    }

    /// The element hosting foreground content, while mounted.
    #[must_use]
    pub fn foreground_element(&self) -> Option<&HtmlElement> {
        self.foreground.and_then(|idx| self.get_element(idx))
    }

    fn take_element(&mut self, idx: u32) -> Option<HtmlElement> {
        self.elements.get_mut(idx as usize)?.take()
    }

    fn put_element(&mut self, idx: u32, el: HtmlElement) {
        let slot = idx as usize;
        if self.elements.len() <= slot {
            self.elements.resize_with(slot + 1, || None);
        }
        self.elements[slot] = Some(el);
    }

    fn detach_error_listener(&self, el: &HtmlElement) {
        let _ = el.remove_event_listener_with_callback(
            "error",
            self.on_image_error.as_ref().unchecked_ref(),
        );
    }

    fn create_element(&self, kind: NodeKind) -> Option<HtmlElement> {
        let tag = match kind {
            NodeKind::Tile { .. } => "img",
            NodeKind::Backdrop { .. } | NodeKind::Foreground => "div",
            _ => return None,
        };
        let Some(doc) = self.container.owner_document() else {
            log::warn!("container has no owner document");
            return None;
        };
        let el: HtmlElement = match doc.create_element(tag) {
            Ok(el) => el.unchecked_into(),
            Err(err) => {
                log::warn!("failed to create <{tag}>: {err:?}");
                return None;
            }
        };
        let s = el.style();
        let _ = s.set_property("position", "absolute");
        let _ = s.set_property("left", "0");
        let _ = s.set_property("top", "0");
        let _ = s.set_property("transform-origin", "0 0");
        match kind {
            NodeKind::Tile { .. } => {
                if let Err(err) = el.add_event_listener_with_callback(
                    "error",
                    self.on_image_error.as_ref().unchecked_ref(),
                ) {
                    log::warn!("failed to add image error listener: {err:?}");
                }
                let _ = el.set_attribute("alt", "");
                let _ = el.set_attribute("decoding", "async");
                let _ = el.set_attribute("draggable", "false");
                let _ = s.set_property("pointer-events", "none");
                let _ = s.set_property("user-select", "none");
            }
            NodeKind::Foreground => {
                let _ = s.set_property("width", "100%");
                let _ = s.set_property("height", "100%");
            }
            _ => {}
        }
        Some(el)
    }
}

impl Drop for DomPresenter {
    fn drop(&mut self) {
        // Surviving elements must not call into the freed closure.
        for el in self.elements.iter().flatten() {
            self.detach_error_listener(el);
        }
    }
}

impl Presenter for DomPresenter {
    fn apply(&mut self, scene: &Scene, changes: &SceneChanges) {
        // 1. Removals
        for &idx in &changes.removed {
            if let Some(el) = self.take_element(idx) {
                self.detach_error_listener(&el);
                el.remove();
            }
            if self.foreground == Some(idx) {
                self.foreground = None;
            }
        }

        // 2. Additions
        for &idx in &changes.added {
            let kind = scene.kind_at(idx);
            let Some(el) = self.create_element(kind) else {
                continue;
            };
            apply_content(&el, scene, idx);
            apply_css_transform(&el, &scene.world_transform_at(idx));
            if let Err(err) = self.container.append_child(&el) {
                log::warn!("failed to attach node {idx}: {err:?}");
                continue;
            }
            if kind == NodeKind::Foreground {
                self.foreground = Some(idx);
            }
            self.put_element(idx, el);
        }

        // 3. Content
        for &idx in &changes.content {
            if let Some(el) = self.get_element(idx) {
                apply_content(el, scene, idx);
            }
        }

        // 4. Transforms
        for &idx in &changes.transforms {
            if let Some(el) = self.get_element(idx) {
                apply_css_transform(el, &scene.world_transform_at(idx));
            }
        }

        // 5. Topology reorder
        if changes.topology_changed {
            for &idx in scene.traversal_order() {
                if let Some(el) = self.get_element(idx) {
                    // DOM re-append moves an existing child, reordering it.
                    let _ = self.container.append_child(el);
                }
            }
        }
    }
}

/// `loading` and `fetchpriority` attribute values.
pub(crate) fn loading_attributes(priority: LoadPriority) -> (&'static str, &'static str) {
    match priority {
        LoadPriority::Eager => ("eager", "high"),
        LoadPriority::Lazy => ("lazy", "low"),
    }
}

/// Warning logged when a tile image fails to load.
pub(crate) fn image_error_message(src: Option<&str>) -> String {
    match src {
        Some(src) => format!("failed to load background image {src}; tile left blank"),
        None => String::from("failed to load a background image; tile left blank"),
    }
}

/// CSS `rgba()` for straight RGBA bytes.
pub(crate) fn css_rgba([r, g, b, a]: [u8; 4]) -> String {
    format!("rgba({r},{g},{b},{})", f64::from(a) / 255.0)
}

/// CSS `matrix()` for a 2D affine.
pub(crate) fn css_matrix(xf: &Affine) -> String {
    let [a, b, c, d, e, f] = xf.as_coeffs();
    format!("matrix({a},{b},{c},{d},{e},{f})")
}

fn apply_css_transform(el: &HtmlElement, xf: &Affine) {
    let _ = el.style().set_property("transform", &css_matrix(xf));
}

fn apply_size(el: &HtmlElement, size: Size) {
    let s = el.style();
    let _ = s.set_property("width", &format!("{}px", size.width));
    let _ = s.set_property("height", &format!("{}px", size.height));
}

/// Syncs kind-dependent attributes and size.
fn apply_content(el: &HtmlElement, scene: &Scene, idx: u32) {
    match scene.kind_at(idx) {
        NodeKind::Tile { image, priority } => {
            let (loading, fetch) = loading_attributes(priority);
            let _ = el.set_attribute("loading", loading);
            let _ = el.set_attribute("fetchpriority", fetch);
            match scene.image(image) {
                Some(src) => {
                    let _ = el.set_attribute("src", src.as_str());
                }
                None => log::warn!("tile {idx} references unknown image {}", image.0),
            }
            apply_size(el, scene.size_at(idx));
        }
        NodeKind::Backdrop { rgba } => {
            let _ = el
                .style()
                .set_property("background-color", &css_rgba(rgba));
            apply_size(el, scene.size_at(idx));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_uses_column_major_coefficients() {
        let xf = Affine::translate((10.0, -5.5)) * Affine::scale(2.0);
        assert_eq!(css_matrix(&xf), "matrix(2,0,0,2,10,-5.5)");
    }

    #[test]
    fn opaque_black_backdrop() {
        assert_eq!(css_rgba([0, 0, 0, 255]), "rgba(0,0,0,1)");
    }

    #[test]
    fn image_error_names_the_source() {
        assert_eq!(
            image_error_message(Some("layers/far.webp")),
            "failed to load background image layers/far.webp; tile left blank"
        );
        assert_eq!(
            image_error_message(None),
            "failed to load a background image; tile left blank"
        );
    }

    #[test]
    fn eager_tiles_fetch_first() {
        assert_eq!(loading_attributes(LoadPriority::Eager), ("eager", "high"));
        assert_eq!(loading_attributes(LoadPriority::Lazy), ("lazy", "low"));
    }
}
