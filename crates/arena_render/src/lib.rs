//! Frame compositing for the arena.
//!
//! Turns a [`arena_core::scene::Scene`] into RGBA frames:
//!
//! - **Background**: sand floor with the roster sidebar on the left
//! - **Decals**: blood splatter, fading with age
//! - **Agents**: circle-clipped avatars, red-tinted once dead, with health bars
//! - **Sidebar**: one thumbnail and health bar per registered player
//!
//! Avatar loading is the only async, fallible step and lives in [`avatar`].
//! Rendering itself never fails.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod avatar;
pub mod canvas;
pub mod renderer;

pub use avatar::{
    decode_avatar, load_avatars, placeholder_avatar, AssetError, AvatarCache, AvatarSource,
    HttpAvatarSource,
};
pub use canvas::{hex, Canvas, Rgb};
pub use renderer::{RenderLayout, SceneRenderer};
