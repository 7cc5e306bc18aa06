use std::rc::Rc;

use anyhow::Result;
use treetrace_engine::Tracker;
use treetrace_protocol::JsonLinesTransport;

/// Drives a small instrumented session and streams it to stdout, covering
/// the general, live-view and shadow-merge paths.
pub fn run() -> Result<()> {
    let transport = Rc::new(JsonLinesTransport::new(std::io::stdout()));
    let tracker = Tracker::new(transport);

    let list = tracker.create_element("ul");
    let item = tracker.create_element("li");
    list.append_child(&item)?;
    item.set_id("first");
    item.set_text("hello");
    item.class_list().add("active")?;
    item.style().set_property("color", "rebeccapurple")?;
    item.dataset().set("itemIndex", "0")?;

    let attr = tracker.create_attr("title", "");
    attr.set_value("written while detached");
    item.set_attribute_node(&attr)?;

    Ok(())
}
