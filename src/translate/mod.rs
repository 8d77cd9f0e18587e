/// Recipe translation module
///
/// This module handles:
/// - The target attribute set and number rendering (attributes.rs)
/// - Per-field mapping and output gating (translator.rs)

pub mod attributes;
pub mod translator;

pub use attributes::{
    Attribute, CurveChannel, FieldMapping, GrayscaleLook, TargetAttributeSet, ToneCurve,
};
pub use translator::{RecipeTranslator, Summary, Translation};
