use montoro::domain::{Block, parse_blocks};

#[test]
fn given_mixed_markdown_when_parsing_then_blocks_are_grouped() {
    let text = "## Resumen\n\nPrimer párrafo\ncontinúa aquí.\n\n- uno\n- dos\n* tres\n\n1. alfa\n2) beta\n\nCierre.";

    let blocks = parse_blocks(text);

    assert_eq!(
        blocks,
        vec![
            Block::Heading {
                level: 2,
                text: "Resumen".to_string()
            },
            Block::Paragraph("Primer párrafo\ncontinúa aquí.".to_string()),
            Block::Bullets(vec!["uno".to_string(), "dos".to_string(), "tres".to_string()]),
            Block::Numbered(vec!["alfa".to_string(), "beta".to_string()]),
            Block::Paragraph("Cierre.".to_string()),
        ]
    );
}

#[test]
fn given_blank_input_when_parsing_then_no_blocks() {
    assert!(parse_blocks("").is_empty());
    assert!(parse_blocks("\n\n   \n").is_empty());
}

#[test]
fn given_list_interrupting_paragraph_when_parsing_then_paragraph_ends_at_list() {
    let blocks = parse_blocks("texto antes\n- item");

    assert_eq!(
        blocks,
        vec![
            Block::Paragraph("texto antes".to_string()),
            Block::Bullets(vec!["item".to_string()]),
        ]
    );
}

#[test]
fn given_deep_heading_when_parsing_then_level_is_preserved() {
    let blocks = parse_blocks("###### detalle");

    assert_eq!(
        blocks,
        vec![Block::Heading {
            level: 6,
            text: "detalle".to_string()
        }]
    );
}

#[test]
fn given_single_hash_when_parsing_then_treated_as_paragraph() {
    // Only ##..###### count as internal headings.
    let blocks = parse_blocks("# titulo");

    assert_eq!(blocks, vec![Block::Paragraph("# titulo".to_string())]);
}
