//! Text serialization properties.

use dashview::text::{Border, BoxType, TextBackend, TextRenderer};
use futures::executor::block_on;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn block_of_lines_is_separated_from_a_following_block() {
    let backend = TextBackend::new();
    let root = backend.root(BoxType::Block);
    let block = root.append_box(BoxType::Block);
    block.append_box(BoxType::Line).append_text("one");
    block.append_box(BoxType::Line).append_text("two");
    assert_eq!(backend.lines(&root), ["one", "two"]);

    root.append_box(BoxType::Block).append_text("three");
    assert_eq!(backend.lines(&root), ["one", "two", "", "three"]);
}

#[test]
fn bullet_border_marks_the_first_line() {
    let border = Border::default().left_fn(|index, _| if index == 0 { "* ".into() } else { "  ".into() });
    let lines = border.apply(&["a".to_string(), "longer".to_string(), "mid".to_string()]);
    assert!(lines[0].starts_with("* "));
    assert!(lines[1].starts_with("  "));
    assert!(lines[2].starts_with("  "));
    assert!(lines.iter().all(|line| line.chars().count() == 8));
}

#[test]
fn numbered_gutter_through_a_view() {
    let backend = TextBackend::new();
    let renderer = TextRenderer::builder(backend.clone()).build();
    renderer
        .define(
            "numbered",
            dashview::RenderFn::new(|call: dashview::RenderCall<TextBackend>| async move {
                let content = call.props.config("content");
                call.renderer.render(&call.node, content, call.data, call.context).await;
                Ok::<_, dashview::DashviewError>(())
            }),
            dashview::ViewOptions::default()
                .box_type(BoxType::Block)
                .border(Border::default().left_fn(|index, total| format!("{}/{total} ", index + 1))),
        )
        .unwrap();
    let root = backend.root(BoxType::Block);
    let config = json!({"view": "numbered", "content": {"view": "list", "item": "text"}});
    block_on(renderer.render(&root, config, json!(["a", "b"]), json!({})));
    assert_eq!(backend.lines(&root), ["1/2 - a", "2/2 - b"]);
}

proptest! {
    #[test]
    fn side_borders_align_every_line(
        content in prop::collection::vec("[a-z ]{0,12}", 1..8),
        wide in 0usize..6,
    ) {
        let border = Border::default()
            .left_fn(move |index, _| if index % 2 == 0 { "#".repeat(wide + 1) } else { "|".to_string() })
            .right("|");
        let lines = border.apply(&content);
        let width = lines[0].chars().count();
        prop_assert_eq!(lines.len(), content.len());
        prop_assert!(lines.iter().all(|line| line.chars().count() == width));
    }

    #[test]
    fn fill_edges_match_the_content_width(content in prop::collection::vec("[a-z]{1,10}", 1..5)) {
        let lines = Border::default().left("[").right("]").top("-").bottom("=").apply(&content);
        let width = lines[1].chars().count();
        prop_assert_eq!(lines[0].chars().count(), width);
        prop_assert_eq!(lines.last().map(|line| line.chars().count()), Some(width));
    }

    #[test]
    fn lines_keep_their_order(words in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        let backend = TextBackend::new();
        let root = backend.root(BoxType::Block);
        for word in &words {
            root.append_box(BoxType::Line).append_text(word);
        }
        prop_assert_eq!(backend.lines(&root), words);
    }
}

fn card_renderer() -> (TextBackend, TextRenderer) {
    let backend = TextBackend::new();
    let renderer = TextRenderer::builder(backend.clone()).build();
    renderer
        .define(
            "card",
            dashview::RenderFn::sync(|call: dashview::RenderCall<TextBackend>| {
                call.node.append_text(call.data.as_str().unwrap_or_default());
                Ok(())
            }),
            dashview::ViewOptions::default()
                .box_type(BoxType::Block)
                .border(Border::frame()),
        )
        .unwrap();
    (backend, renderer)
}

#[test]
fn framed_view_with_blank_content_serializes_to_nothing() {
    let (backend, renderer) = card_renderer();
    let root = backend.root(BoxType::Block);
    block_on(renderer.render(&root, "card", json!("\n"), json!({})));
    assert_eq!(backend.serialize(&root), "");
}

#[test]
fn frames_measure_wide_characters_in_cells() {
    let (backend, renderer) = card_renderer();
    let root = backend.root(BoxType::Block);
    block_on(renderer.render(&root, "card", json!("名前\nid"), json!({})));
    assert_eq!(backend.lines(&root), ["+------+", "| 名前 |", "| id   |", "+------+"]);
}
