// src/lib.rs

pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod logging;
pub mod params;
pub mod path;
pub mod rotation;
pub mod scene;
pub mod sensor;
pub mod source;
pub mod vec3;

pub use engine::{compute_field, get_b, get_h, Engine};
pub use error::{FieldError, Result};
pub use field::{AnalyticEvaluator, FieldEvaluator, FormulaBatch};
pub use params::{EvalOptions, FieldKind};
pub use path::Path;
pub use rotation::Rotation;
pub use scene::{CollectionId, Member, Scene, SensorId, SourceId};
pub use sensor::{Observer, PixelGrid, Sensor};
pub use source::{Family, Source, SourceKind};
