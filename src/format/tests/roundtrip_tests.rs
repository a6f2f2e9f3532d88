//! Save/load round trips through the annotation board.

use crate::board::AnnotationBoard;
use crate::editor::EditorState;
use crate::format::AnnotationSet;
use crate::geometry::Vertex;
use crate::model::ZoneType;

/// Build a board with a closed parking zone and an open exclusion zone.
fn create_annotated_board() -> AnnotationBoard {
    let mut board = AnnotationBoard::default();
    board.load(AnnotationSet::new("lot.png", 800.0, 450.0));

    board.add_polygon(ZoneType::Parking).unwrap();
    for (x, y) in [(50.0, 50.0), (250.0, 50.0), (250.0, 200.0), (50.0, 200.0)] {
        board.pointer_down(Vertex::new(x, y));
    }
    board.pointer_down(Vertex::new(52.0, 51.0));

    board.add_polygon(ZoneType::Exclusion).unwrap();
    board.pointer_down(Vertex::new(500.0, 300.0));
    board.pointer_down(Vertex::new(600.0, 300.0));
    board
}

#[test]
fn test_board_json_board_round_trip() {
    let board = create_annotated_board();
    let saved = board.save().expect("Failed to save");
    let json = saved.to_json().expect("Failed to serialize");

    let mut restored = AnnotationBoard::default();
    restored.load(AnnotationSet::from_json(&json).expect("Failed to deserialize"));

    let states: Vec<_> = restored.polygons().map(|e| e.state()).collect();
    assert_eq!(states, vec![EditorState::Complete, EditorState::Drawing]);
    assert_eq!(restored.zone_count(ZoneType::Parking), 1);
    assert_eq!(restored.zone_count(ZoneType::Exclusion), 1);

    // A second save produces the same document
    assert_eq!(restored.save().unwrap(), saved);
}

#[test]
fn test_restored_polygon_keeps_drawing() {
    let saved = create_annotated_board().save().unwrap();
    let open_id = saved.annotation_data[1].id.clone();

    let mut restored = AnnotationBoard::default();
    restored.load(saved);
    assert_eq!(restored.active_id(), Some(&open_id));

    restored.pointer_down(Vertex::new(550.0, 400.0));
    restored.pointer_down(Vertex::new(501.0, 301.0));
    let editor = restored.editor(&open_id).unwrap();
    assert!(editor.is_complete());
    assert_eq!(editor.vertices().len(), 3);
}

#[test]
fn test_invalid_complete_polygon_is_reopened() {
    let json = r#"{
        "imageUrl": "lot.png",
        "imageWidth": 800,
        "imageHeight": 450,
        "annotationData": [
            { "id": "short", "zoneType": "PARKING", "vertices": [[1, 1], [5, 5]], "complete": true }
        ]
    }"#;
    let mut board = AnnotationBoard::default();
    board.load(AnnotationSet::from_json(json).unwrap());

    let editor = board.polygons().next().unwrap();
    assert_eq!(editor.state(), EditorState::Drawing);
    assert_eq!(editor.vertices().len(), 2);
}
