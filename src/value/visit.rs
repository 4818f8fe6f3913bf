//! Read-only traversal interface for emitters
//!
//! Emitters receive values through variant dispatch; they never see the
//! type graph or mutate anything. Container values expose their
//! element/field values in declaration order, and a record value exposes
//! its discriminator name (`VRecord::discriminator`) ahead of its
//! fields. Visitors recurse by calling `Value::accept` on children.

use super::node::{VBool, VFloat, VInt, VList, VLong, VMap, VRecord, VStr};

/// Variant-dispatched visitor over value nodes. Methods default to
/// no-ops so an emitter only implements the variants it cares about.
pub trait ValueVisitor {
    fn visit_bool(&mut self, _value: &VBool) {}
    fn visit_int(&mut self, _value: &VInt) {}
    fn visit_long(&mut self, _value: &VLong) {}
    fn visit_float(&mut self, _value: &VFloat) {}
    fn visit_str(&mut self, _value: &VStr) {}
    fn visit_list(&mut self, _value: &VList) {}
    fn visit_map(&mut self, _value: &VMap) {}
    fn visit_record(&mut self, _value: &VRecord) {}
}
