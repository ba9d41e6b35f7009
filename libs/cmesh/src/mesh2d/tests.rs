use super::*;

fn square() -> Mesh2D {
    let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
    Mesh2D::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap()
}

/// Unit square split into four triangles around its center.
fn fan() -> Mesh2D {
    let positions = [
        DVec2::ZERO,
        DVec2::X,
        DVec2::ONE,
        DVec2::Y,
        DVec2::splat(0.5),
    ];
    Mesh2D::from_triangles(&positions, &[[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]]).unwrap()
}

#[test]
fn square_is_consistent() {
    let mesh = square();
    mesh.verify().unwrap();
    assert_eq!(mesh.node_count(), 4);
    assert_eq!(mesh.element_count(), 2);
    assert_eq!(mesh.boundary_nodes().unwrap(), (0..4).map(NodeId).collect::<Vec<_>>());
    let stats = mesh.grid().unwrap().cell_stats();
    let placed = stats.nodes.mean * stats.nodes.occupied as f64;
    assert_eq!(placed.round() as usize, 4);
    assert!(stats.elements.max <= 2);
}

#[test]
fn diagonal_links_both_triangles() {
    let mesh = square();
    // Edge use 2 of element 0 runs 2 -> 0.
    assert_eq!(mesh.neighbors_of(ElementId(0), 2), Some(ElementId(1)));
    assert_eq!(mesh.neighbors_of(ElementId(1), 0), Some(ElementId(0)));
    assert_eq!(mesh.neighbors_of(ElementId(0), 0), None);
    assert_eq!(mesh.neighbors_of(ElementId(0), 3), None);
    // Node 1 of element 0 faces the diagonal.
    assert_eq!(Mesh2D::side_opposite(1), 2);
}

#[test]
fn negative_input_is_reordered() {
    let mut mesh = Mesh2D::new();
    let a = mesh.add_node(DVec2::ZERO);
    let b = mesh.add_node(DVec2::X);
    let c = mesh.add_node(DVec2::Y);
    let e = mesh.add_element(a, c, b).unwrap();
    assert!(mesh.signed_area2(e) > 0.0);
    assert_eq!(mesh.element_nodes(e), &[a, b, c]);
    mesh.verify().unwrap();
}

#[test]
fn degenerate_input_is_rejected() {
    let mut mesh = Mesh2D::new();
    let a = mesh.add_node(DVec2::ZERO);
    let b = mesh.add_node(DVec2::X);
    let c = mesh.add_node(DVec2::X * 2.0);
    assert!(matches!(
        mesh.add_element(a, b, c),
        Err(MeshError::DegenerateElement { .. })
    ));
    assert!(matches!(
        mesh.add_element(a, a, b),
        Err(MeshError::DegenerateElement { .. })
    ));
    assert_eq!(
        mesh.add_element(a, b, NodeId(9)),
        Err(MeshError::InvalidNode(NodeId(9)))
    );
    assert_eq!(mesh.element_count(), 0);
    assert_eq!(mesh.max_element_index(), 0);
}

#[test]
fn third_triangle_on_an_edge_is_rejected() {
    let mut mesh = square();
    let extra = mesh.add_node(DVec2::new(0.8, 0.2));
    let err = mesh.add_element(NodeId(0), NodeId(2), extra).unwrap_err();
    assert!(matches!(err, MeshError::NonManifold { what: "edge", .. }));
    assert_eq!(mesh.element_count(), 2);
    mesh.verify().unwrap();
}

#[test]
fn center_of_fan_is_interior() {
    let mesh = fan();
    mesh.verify().unwrap();
    assert!(!mesh.is_boundary(NodeId(4)).unwrap());
    assert!(mesh.is_boundary(NodeId(0)).unwrap());
    assert_eq!(mesh.count_boundary_nodes().unwrap(), 4);
    assert_eq!(mesh.incident_elements(NodeId(4)).unwrap().len(), 4);
    assert_eq!(mesh.disk_walk(NodeId(4)).unwrap().len(), 4);
    let mut ring = mesh.node_ring(NodeId(4)).unwrap();
    ring.sort();
    assert_eq!(ring, (0..4).map(NodeId).collect::<Vec<_>>());
    assert!(mesh.is_boundary_element(ElementId(2)));
}

#[test]
fn element_rings_of_fan() {
    let mut mesh = fan();
    let nodes = mesh.element_ring_nodes(ElementId(0)).unwrap();
    assert_eq!(&nodes[..3], &[NodeId(0), NodeId(1), NodeId(4)]);
    let mut rest = nodes[3..].to_vec();
    rest.sort();
    assert_eq!(rest, vec![NodeId(2), NodeId(3)]);

    // Sides 1 and 2 of element 0 face elements 1 and 3; element 2 only
    // touches the center node.
    let elements = mesh.element_ring_elements(ElementId(0)).unwrap();
    assert_eq!(elements, [0, 1, 3, 2].map(ElementId).to_vec());

    mesh.delete_element(ElementId(2)).unwrap();
    assert_eq!(
        mesh.element_ring_elements(ElementId(0)).unwrap(),
        [0, 1, 3].map(ElementId).to_vec()
    );
    assert_eq!(
        mesh.element_ring_nodes(ElementId(2)),
        Err(MeshError::InvalidElement(ElementId(2)))
    );
}

#[test]
fn boundary_flags_are_stored() {
    let mut mesh = fan();
    assert_eq!(mesh.set_boundary_flags().unwrap(), 4);
    assert!(mesh.node(NodeId(0)).unwrap().boundary);
    assert!(!mesh.node(NodeId(4)).unwrap().boundary);
}

#[test]
fn delete_element_opens_the_fan() {
    let mut mesh = fan();
    mesh.delete_element(ElementId(0)).unwrap();
    mesh.verify().unwrap();
    assert!(mesh.is_boundary(NodeId(4)).unwrap());
    assert_eq!(mesh.element_count(), 3);
    assert_eq!(mesh.max_element_index(), 4);
    assert_eq!(mesh.neighbors_of(ElementId(1), 2), None);
    assert_eq!(
        mesh.delete_element(ElementId(0)),
        Err(MeshError::InvalidElement(ElementId(0)))
    );

    let map = mesh.squeeze().unwrap();
    assert_eq!(
        map.elements,
        vec![None, Some(ElementId(0)), Some(ElementId(1)), Some(ElementId(2))]
    );
    assert_eq!(mesh.max_element_index(), 3);
    mesh.verify().unwrap();
}

#[test]
fn delete_node_removes_its_triangles() {
    let mut mesh = fan();
    mesh.delete_node(NodeId(4)).unwrap();
    assert_eq!(mesh.element_count(), 0);
    assert_eq!(mesh.node_count(), 4);
    assert!(!mesh.is_node_valid(NodeId(4)));

    let map = mesh.squeeze().unwrap();
    assert_eq!(map.nodes[4], None);
    assert_eq!(map.nodes[3], Some(NodeId(3)));
    assert_eq!(mesh.max_node_index(), 4);
}

#[test]
fn mirrored_mesh_is_reoriented() {
    let mut mesh = fan();
    let mirrored: Vec<_> = (0..5)
        .map(|i| {
            let p = mesh.position(NodeId(i));
            DVec2::new(-p.x, p.y)
        })
        .collect();
    mesh.set_positions(&mirrored).unwrap();
    assert!(mesh.verify().is_err());
    assert_eq!(mesh.fix_negative_elements().unwrap(), 4);
    mesh.verify().unwrap();
    assert_eq!(mesh.fix_negative_elements().unwrap(), 0);
    assert_eq!(mesh.bounding_box().min, DVec2::new(-1.0, 0.0));
}

#[test]
fn set_positions_checks_the_count() {
    let mut mesh = square();
    assert_eq!(
        mesh.set_positions(&[DVec2::ZERO]),
        Err(MeshError::PositionCount {
            expected: 4,
            found: 1
        })
    );
}

#[test]
fn locate_points() {
    let mesh = square();
    assert_eq!(
        mesh.locate_enclosing_element(DVec2::new(0.75, 0.25)),
        Ok(ElementId(0))
    );
    assert_eq!(
        mesh.locate_enclosing_element(DVec2::new(0.25, 0.75)),
        Ok(ElementId(1))
    );
    assert!(mesh.locate_enclosing_element(DVec2::ONE).is_ok());
    assert_eq!(
        mesh.locate_enclosing_element(DVec2::new(1.5, 0.5)),
        Err(MeshError::NotFound)
    );
}

#[test]
fn locate_inside_box_but_outside_mesh() {
    let positions = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
    let mesh = Mesh2D::from_triangles(&positions, &[[0, 1, 3]]).unwrap();
    assert_eq!(
        mesh.locate_enclosing_element(DVec2::new(0.9, 0.9)),
        Err(MeshError::NotFound)
    );
}

#[test]
fn locate_with_stale_grid_scans() {
    let mut mesh = square();
    mesh.add_node(DVec2::new(5.0, 5.0));
    assert!(mesh.grid().is_none());
    assert_eq!(
        mesh.locate_enclosing_element(DVec2::new(0.75, 0.25)),
        Ok(ElementId(0))
    );
    assert_eq!(Mesh2D::new().locate_enclosing_element(DVec2::ZERO), Err(MeshError::EmptyMesh));
}

#[test]
fn find_node_within_tolerance() {
    let mesh = square();
    assert_eq!(mesh.find_node(DVec2::new(1.0, 1.0 + 1e-9)), Some(NodeId(2)));
    assert_eq!(mesh.find_node(DVec2::splat(0.5)), None);
    assert_eq!(mesh.max_sq_edge_length(), 2.0);
}

#[test]
fn verify_reports_broken_links() {
    let mut mesh = square();
    mesh.arena.edge_uses[2].opp = None;
    assert!(matches!(mesh.verify(), Err(MeshError::Topology { .. })));

    let mut mesh = square();
    mesh.arena.edge_uses[0].nnxt = EdgeUseId(1);
    assert!(matches!(
        mesh.is_boundary(NodeId(0)),
        Err(MeshError::Topology { .. })
    ));
}
