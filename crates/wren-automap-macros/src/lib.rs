//! Derive macros for Wren foreign classes.
//!
//! # Example
//!
//! ```ignore
//! use wren_automap::ForeignType;
//!
//! #[derive(Clone, ForeignType)]
//! #[wren(name = "Player", extend = player_methods)]
//! pub struct Player {
//!     #[wren(get, set)]
//!     pub health: f64,
//!
//!     #[wren(get, name = "displayName")]
//!     pub display_name: String,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod derive_foreign;

/// Derive `ForeignType`, describing a struct as a foreign class.
///
/// # Attributes
///
/// - `#[wren(name = "...")]` - Override the script class name
/// - `#[wren(superclass = "...")]` - Add an `is ...` clause to the class header
/// - `#[wren(extend = path)]` - Pass the builder through
///   `fn(ClassBuilder<Self>) -> Result<ClassBuilder<Self>, RegistrationError>`
///   after the fields, to add constructors and methods
///
/// # Field Attributes
///
/// - `#[wren(get)]` - Generate a getter (field must be `Clone`)
/// - `#[wren(set)]` - Generate a setter
/// - `#[wren(name = "...")]` - Override the property name
#[proc_macro_derive(ForeignType, attributes(wren))]
pub fn derive_foreign_type(input: TokenStream) -> TokenStream {
    derive_foreign::derive_foreign_type_impl(input)
}
