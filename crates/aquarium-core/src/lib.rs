//! Aquarium Core - Scene state, asset parsing, and configuration
//!
//! This crate holds everything about the aquarium that does not depend on
//! the rendering engine:
//! - Scene configuration (TOML) with defaults for every parameter
//! - Wavefront OBJ/MTL parsing for the fish and squid models
//! - The fish school and the assembler state mutated by the controls
//! - Interaction commands and DOM value parsing
//! - Asset load sequencing, spotlight layout, and texture set descriptions

pub mod aquarium;
pub mod command;
pub mod config;
pub mod lights;
pub mod loading;
pub mod mtl;
pub mod obj;
pub mod school;
pub mod textures;

pub use aquarium::{Aquarium, Backdrop};
pub use command::{AquariumCommand, ButtonKind, SliderKind};
pub use config::{AquariumConfig, ConfigError};
pub use loading::{LoadError, LoadSequence, LoadStep};
pub use mtl::{MaterialDescription, MtlError};
pub use obj::{ObjError, ObjGroup, ObjModel};
pub use school::{Fish, School};
pub use textures::{HeightField, MapKind, TextureError, TextureMap, TextureSet};
