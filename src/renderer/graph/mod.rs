//! Frame Graph
//!
//! A frame is a fixed chain of [`RenderNode`]s sharing one
//! [`FrameContext`]:
//!
//! ```text
//! ShadowNode ─► MainSceneNode ─┐
//!          └──► DepthOfFieldNode ┴─► BloomNode ─► PresentNode
//! ```
//!
//! Exactly one of the two scene nodes runs, chosen by
//! [`DofSettings::enabled`](crate::resources::DofSettings::enabled). The
//! chosen node publishes [`FrameContext::scene_color`]; bloom publishes
//! [`FrameContext::final_color`].

pub mod context;
pub mod node;
pub mod passes;
pub mod targets;

pub use context::FrameContext;
pub use node::RenderNode;
pub use passes::{BloomNode, DepthOfFieldNode, MainSceneNode, PresentNode, ShadowNode};
pub use targets::FrameTargets;
