use parser::{types::FragmentSpread, Positioned};

use crate::{Visitor, VisitorContext};

/// Every fragment spread must name a fragment defined in the document.
#[derive(Default)]
pub struct KnownFragmentNames;

impl<'a> Visitor<'a> for KnownFragmentNames {
    fn enter_fragment_spread(&mut self, ctx: &mut VisitorContext<'a>, fragment_spread: &'a Positioned<FragmentSpread>) {
        let name = &fragment_spread.node.fragment_name.node;
        if ctx.fragment(name).is_none() {
            ctx.report_error(vec![fragment_spread.pos], format!("Unknown fragment \"{}\"", name));
        }
    }
}
