//! Form registry specialization

use crate::forms::Form;
use crate::registry::UriTree;

/// The hierarchical registry of [`Form`]s owned by one multiform
///
/// A pure specialization of [`UriTree`] named for domain clarity; every
/// registry operation applies unchanged with `Form` as the item type.
pub type FormGroup = UriTree<Form>;
