//! Inkroom Render Library
//!
//! Replay-log renderer for the Inkroom whiteboard and the view that wires a
//! session to a painter. The Vello painter is available behind the
//! `vello-renderer` feature.

pub mod display_list;
mod renderer;
pub mod view;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use display_list::{DisplayList, DrawCommand};
pub use renderer::{
    Background, GUIDE_COLOR, GUIDE_SPACING, GUIDE_WIDTH, LiveInk, PAPER_COLOR, Painter, RenderContext,
    RenderResult, Renderer, RendererError,
};
pub use view::WhiteboardView;

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloPainter;
