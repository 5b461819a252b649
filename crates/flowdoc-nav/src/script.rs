//! jsTree binding script.

use std::fmt::Write as _;

/// Id of the navigation panel element the tree is bound to.
pub const TREE_ELEMENT_ID: &str = "fd-site-map-tree";

/// Key of the jsTree state plugin storage.
pub const STATE_KEY: &str = "fd-site-map-tree";

/// Tree node property carrying the action identifier.
pub const ACTION_ID_ATTRIBUTE: &str = "data-action-id";

/// Drops the persisted selection so a page never highlights the previous one.
const CLEAR_SELECTION_FILTER: &str = "function(state) { delete state.core.selected; return state; }";

/// Build the script that binds the tree config to `#element_id`.
///
/// `config` is the serialized jsTree configuration. The search callback
/// matches nodes whose action id is in the space-delimited result list, or
/// whose text contains the query.
pub(crate) fn binding_script(config: &str, element_id: &str) -> String {
    let mut script = String::with_capacity(config.len() + 512);
    script.push_str("$(document).ready(function() {\n");
    let _ = writeln!(script, "  var tree = {config};");
    let _ = writeln!(script, "  tree.state.filter = {CLEAR_SELECTION_FILTER};");
    let _ = writeln!(
        script,
        "  tree.search.search_callback = function(results, node) {{ \
         return results.split(' ').includes(node.original['{ACTION_ID_ATTRIBUTE}']) \
         || node.text.indexOf(results) !== -1; }};"
    );
    let _ = writeln!(script, "  $('#{element_id}').jstree(tree);");
    script.push_str("});\n");
    script
}
