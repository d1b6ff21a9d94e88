/// Demo scenes and camera setups
use std::f64::consts::PI;
use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use scenerast_core::{shapes, Angles, Camera, Color, NodeId, RenderMode, RenderResult, RenderSettings, SceneGraph};

/// A scenegraph together with the root to render it from.
pub struct Scene {
    pub graph: SceneGraph,
    pub root: NodeId,
}

/// Segment sizes and joint angles of the robot arm.
#[derive(Debug, Clone, Copy)]
pub struct ArmParams {
    /// Side of the square cross-section.
    pub diameter: f64,
    pub upper_arm: f64,
    pub forearm: f64,
    pub hand: f64,
    pub shoulder: Angles,
    pub elbow: Angles,
    pub wrist: Angles,
}

impl Default for ArmParams {
    fn default() -> Self {
        Self {
            diameter: 1.5,
            upper_arm: 7.0,
            forearm: 5.0,
            hand: 2.0,
            shoulder: Angles::new(PI / 10.0, 0.0, -PI / 8.0),
            elbow: Angles::new(-PI / 1.5, 0.0, PI / 5.0),
            wrist: Angles::new(0.0, -PI / 5.0, -PI / 4.0),
        }
    }
}

/// The arm plus the ball and tree garden of the combined scene.
#[derive(Debug, Clone, Copy)]
pub struct CombinedParams {
    pub arm: ArmParams,
    pub tree_height: f64,
    pub ball_radius: f64,
    /// Rotation of both trees at their roots.
    pub tree_bend: Angles,
    /// Rotation of both crowns at the top of the trunks.
    pub trunk_bend: Angles,
}

impl Default for CombinedParams {
    fn default() -> Self {
        Self {
            arm: ArmParams {
                diameter: 1.0,
                upper_arm: 5.0,
                forearm: 5.0,
                hand: 2.0,
                shoulder: Angles::new(PI / 4.0, 0.0, 0.0),
                elbow: Angles::new(-PI / 2.0, 0.0, 0.0),
                wrist: Angles::new(0.0, PI / 2.0, PI / 4.0),
            },
            tree_height: 10.0,
            ball_radius: 2.5,
            tree_bend: Angles::new(0.0, PI / 10.0, 0.0),
            trunk_bend: Angles::new(0.0, -PI / 5.0, 0.0),
        }
    }
}

fn rgb256(r: u8, g: u8, b: u8) -> RenderResult<Color> {
    Color::from_bytes(r, g, b, 256.0)
}

/// Chain `nodes` so that each is the only child of the one before it.
fn chain(sg: &mut SceneGraph, nodes: &[NodeId]) -> RenderResult<()> {
    for pair in nodes.windows(2) {
        sg.add_child(pair[0], pair[1])?;
    }
    Ok(())
}

/// A floor slab and a three-segment arm built from one shared cube.
///
/// The segments are modelled along +Y with the joint at their base, then the
/// whole arm is pitched upright. No surfaces are set, so everything renders in
/// the default grey.
pub fn arm_scene(p: &ArmParams) -> RenderResult<Scene> {
    let mut sg = SceneGraph::new();
    let cube = sg.add_shape(Arc::new(shapes::cube(2.0)?), "Cube");

    let below_xy = sg.add_translate(Vector3::new(0.0, 0.0, -1.0), "Put floor below X-Y plane");
    let floor = sg.add_scale(Vector3::new(7.5, 7.5, 0.5), "Resize floor");
    chain(&mut sg, &[floor, below_xy, cube])?;

    let hinge = sg.add_translate(Vector3::new(0.0, 1.0, 0.0), "Put the hinge on the bottom");
    let diam = sg.add_scale(Vector3::new(p.diameter / 2.0, 0.5, p.diameter / 2.0), "Set diameter");
    chain(&mut sg, &[diam, hinge, cube])?;

    let hand = sg.add_scale(Vector3::new(1.0, p.hand, 1.0), "Hand length");
    let forearm = sg.add_scale(Vector3::new(1.0, p.forearm, 1.0), "Forearm length");
    let upper_arm = sg.add_scale(Vector3::new(1.0, p.upper_arm, 1.0), "Upper-arm length");
    for segment in [hand, forearm, upper_arm] {
        sg.add_child(segment, diam)?;
    }

    let wrist = sg.add_rotate(p.wrist, "Wrist rotation");
    let hand_pos = sg.add_translate(Vector3::new(0.0, p.forearm, 0.0), "Hand -> end of arm");
    chain(&mut sg, &[hand_pos, wrist, hand])?;

    let lower = sg.add_group("Forearm and hand");
    sg.add_child(lower, hand_pos)?;
    sg.add_child(lower, forearm)?;

    let elbow = sg.add_rotate(p.elbow, "Elbow rotation");
    let lower_pos = sg.add_translate(Vector3::new(0.0, p.upper_arm, 0.0), "Forearm and hand -> end of upper arm");
    chain(&mut sg, &[lower_pos, elbow, lower])?;

    let arm = sg.add_group("Whole arm");
    sg.add_child(arm, lower_pos)?;
    sg.add_child(arm, upper_arm)?;

    let shoulder = sg.add_rotate(p.shoulder, "Shoulder rotation");
    let upright = sg.add_rotate(Angles::new(0.0, PI / 2.0, 0.0), "Put arm upright");
    chain(&mut sg, &[upright, shoulder, arm])?;

    let scene = sg.add_group("Floor and arm");
    sg.add_child(scene, floor)?;
    sg.add_child(scene, upright)?;

    let root = sg.add_root("");
    sg.add_child(root, scene)?;

    Ok(Scene { graph: sg, root })
}

/// The arm on one half of a green floor, a squished ball flanked by two trees
/// on the other.
///
/// Built along +Y as up and pitched into place at the root. The arm segments
/// share one unit cube, the trees share their crown and trunk subtrees.
pub fn combined_scene(p: &CombinedParams) -> RenderResult<Scene> {
    let a = &p.arm;
    let mut sg = SceneGraph::new();

    let root = sg.add_root("");
    let final_rotation = sg.add_rotate(Angles::new(0.0, PI / 2.0, 0.0), "final rotation");
    let everything = sg.add_group("floor, upper arm, forearm, and hand group");
    chain(&mut sg, &[root, final_rotation, everything])?;

    // Unit cube shared by the floor and the arm segments
    let cube = sg.add_shape(Arc::new(shapes::cube(2.0)?), "cube");
    let unit = sg.add_scale(Vector3::new(0.5, 0.5, 0.5), "scale cube to unit cube");
    sg.add_child(unit, cube)?;
    let base = sg.add_translate(Vector3::new(0.0, 0.5, 0.0), "arm translation");
    sg.add_child(base, unit)?;

    let floor_pos = sg.add_translate(Vector3::new(0.0, -0.5, 0.0), "floor trans");
    let floor_scale = sg.add_scale(Vector3::new(15.0, 1.0, 15.0), "floor scale");
    let floor_surf = sg.add_surface(rgb256(21, 112, 39)?, "f-surf");
    chain(&mut sg, &[everything, floor_pos, floor_scale, floor_surf, unit])?;

    // Arm
    let arm_pos = sg.add_translate(Vector3::new(0.0, 0.0, 3.5), "whole arm translate");
    let shoulder = sg.add_rotate(a.shoulder, "shoulder rotation");
    let arm = sg.add_group("upper arm, forearm, and hand group");
    chain(&mut sg, &[everything, arm_pos, shoulder, arm])?;

    let upper_scale = sg.add_scale(Vector3::new(a.diameter, a.upper_arm, a.diameter), "upper arm scale");
    let upper_surf = sg.add_surface(rgb256(130, 23, 79)?, "upper arm surf");
    chain(&mut sg, &[arm, upper_scale, upper_surf, base])?;

    let lower_pos = sg.add_translate(Vector3::new(0.0, a.upper_arm, 0.0), "forearm and hand translation");
    let elbow = sg.add_rotate(a.elbow, "elbow rotation");
    let lower = sg.add_group("forearm and hand group");
    chain(&mut sg, &[arm, lower_pos, elbow, lower])?;

    let fore_scale = sg.add_scale(Vector3::new(a.diameter, a.forearm, a.diameter), "forearm scale");
    let fore_surf = sg.add_surface(rgb256(222, 27, 206)?, "forearm surf");
    chain(&mut sg, &[lower, fore_scale, fore_surf, base])?;

    let hand_pos = sg.add_translate(Vector3::new(0.0, a.forearm, 0.0), "hand translation");
    let wrist = sg.add_rotate(a.wrist, "wrist rotation");
    let hand_scale = sg.add_scale(Vector3::new(a.diameter, a.hand, a.diameter), "hand scale");
    let hand_surf = sg.add_surface(rgb256(202, 151, 204)?, "hand surf");
    chain(&mut sg, &[lower, hand_pos, wrist, hand_scale, hand_surf, base])?;

    // Ball and trees
    let garden_pos = sg.add_translate(Vector3::new(0.0, 0.0, -3.5), "whole scene translate");
    let garden = sg.add_group("every shape group");
    chain(&mut sg, &[everything, garden_pos, garden])?;

    let r = p.ball_radius;
    let ball_scale = sg.add_scale(Vector3::new(r, r, r), "ball scale");
    let ball_lift = sg.add_translate(Vector3::new(0.0, 1.0, 0.0), "above floor trans");
    let ball_surf = sg.add_surface(rgb256(91, 199, 252)?, "squished ball surf");
    let ball = sg.add_shape(Arc::new(shapes::squished_ball(7)?), "squished ball");
    chain(&mut sg, &[garden, ball_scale, ball_lift, ball_surf, ball])?;

    let trees_bend = sg.add_rotate(p.tree_bend, "trees rotate");
    let trees = sg.add_group("two trees");
    chain(&mut sg, &[garden, trees_bend, trees])?;

    let crown_pos = sg.add_translate(Vector3::new(0.0, p.tree_height / 2.0, 0.0), "doubleCones trans");
    let crown_bend = sg.add_rotate(p.trunk_bend, "doubleCones rotate");
    let crown_scale = sg.add_scale(Vector3::new(1.0, 0.25 * p.tree_height, 1.0), "doubleCones scale");
    let crown_lift = sg.add_translate(Vector3::new(0.0, 1.0, 0.0), "above floor trans");
    let crown_surf = sg.add_surface(rgb256(41, 255, 66)?, "doubleCones surf");
    let crown = sg.add_shape(Arc::new(shapes::double_cone(12)?), "double cone");
    chain(&mut sg, &[crown_pos, crown_bend, crown_scale, crown_lift, crown_surf, crown])?;

    let trunk_scale = sg.add_scale(Vector3::new(0.5, 0.25 * p.tree_height, 0.5), "cylinders scale");
    let trunk_lift = sg.add_translate(Vector3::new(0.0, 1.0, 0.0), "above floor trans");
    let trunk_surf = sg.add_surface(rgb256(107, 71, 4)?, "cylinders surface");
    let trunk = sg.add_shape(Arc::new(shapes::prism(12)?), "cylinder");
    chain(&mut sg, &[trunk_scale, trunk_lift, trunk_surf, trunk])?;

    for (x, name) in [(4.0, "tree one"), (-4.0, "tree two")] {
        let pos = sg.add_translate(Vector3::new(x, 0.0, 0.0), &format!("{} trans", name));
        let tree = sg.add_group(&format!("{} group", name));
        chain(&mut sg, &[trees, pos, tree])?;
        sg.add_child(tree, crown_pos)?;
        sg.add_child(tree, trunk_scale)?;
    }

    Ok(Scene { graph: sg, root })
}

/// A camera pose plus the image it is meant to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSetup {
    pub eye: Point3<f64>,
    pub look_at: Point3<f64>,
    pub up: Vector3<f64>,
    pub near: f64,
    pub far: f64,
    pub width: usize,
    pub height: usize,
    /// Larger of the two full view angles, in degrees.
    pub max_angle: f64,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            eye: Point3::new(13.2, -41.2, 19.0),
            look_at: Point3::new(0.0, 0.0, 2.5),
            up: Vector3::new(0.0, 0.0, 1.0),
            near: 0.01,
            far: 300.0,
            width: 300,
            height: 200,
            max_angle: 35.0,
        }
    }
}

impl CameraSetup {
    /// One of the three numbered views of the demo scenes.
    pub fn view(n: u8) -> Option<Self> {
        let first = Self::default();
        match n {
            1 => Some(first),
            2 => Some(Self {
                eye: Point3::new(-40.2, -13.2, 42.0),
                width: 300,
                height: 300,
                max_angle: 20.0,
                ..first
            }),
            3 => Some(Self {
                eye: Point3::new(-30.2, -32.2, 19.0),
                near: 83.0,
                far: 105.0,
                width: 350,
                height: 450,
                max_angle: 34.0,
                ..first
            }),
            _ => None,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// A camera in this pose with view angles fitted to the image shape.
    pub fn camera(&self) -> RenderResult<Camera> {
        let mut camera = Camera::look_at(self.eye, self.look_at, self.up, self.near, self.far)?;
        camera.set_view_angles(self.aspect_ratio(), self.max_angle)?;
        Ok(camera)
    }

    pub fn settings(&self, mode: RenderMode) -> RenderSettings {
        RenderSettings::new(self.width, self.height, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenerast_core::{render, RenderOutput};

    #[test]
    fn test_arm_scene_instances() {
        let scene = arm_scene(&ArmParams::default()).unwrap();
        let instances = scene.graph.composite_transforms(scene.root).unwrap();
        // Floor plus three arm segments, all the same cube
        assert_eq!(instances.len(), 4);
        assert!(instances.iter().all(|i| i.shape == instances[0].shape));
        assert!(instances.iter().all(|i| i.surface.is_none()));
    }

    #[test]
    fn test_combined_scene_instances() {
        let scene = combined_scene(&CombinedParams::default()).unwrap();
        let instances = scene.graph.composite_transforms(scene.root).unwrap();
        // Floor, three arm segments, ball, two crowns, two trunks
        assert_eq!(instances.len(), 9);
        assert!(instances.iter().all(|i| i.surface.is_some()));

        let floor = rgb256(21, 112, 39).unwrap();
        assert_eq!(instances[0].color(), floor);
    }

    #[test]
    fn test_combined_tree_shares_subtrees() {
        let scene = combined_scene(&CombinedParams::default()).unwrap();
        let tree = scene.graph.print_tree(scene.root).unwrap();
        assert_eq!(tree.matches("ShapeNode 'double cone'").count(), 2);
        assert_eq!(tree.matches("ShapeNode 'cylinder'").count(), 2);
        assert_eq!(tree.matches("ShapeNode 'cube'").count(), 4);
    }

    #[test]
    fn test_views_build_cameras() {
        for n in 1..=3 {
            let setup = CameraSetup::view(n).unwrap();
            let camera = setup.camera().unwrap();
            assert!((camera.natural_aspect_ratio() - setup.aspect_ratio()).abs() < 1e-9);
        }
        assert!(CameraSetup::view(4).is_none());
        assert_eq!(CameraSetup::view(1), Some(CameraSetup::default()));
    }

    #[test]
    fn test_combined_scene_renders_its_colors() {
        let scene = combined_scene(&CombinedParams::default()).unwrap();
        let setup = CameraSetup::view(1).unwrap();
        let camera = setup.camera().unwrap();
        let output = render(&scene.graph, scene.root, &camera, &setup.settings(RenderMode::Raster)).unwrap();
        let RenderOutput::Image(frame) = output else {
            panic!("raster mode returns an image");
        };
        assert_eq!((frame.width(), frame.height()), (300, 200));
        let drawn = (0..frame.height())
            .flat_map(|b| frame.row(b).iter())
            .filter(|c| **c != Color::WHITE)
            .count();
        assert!(drawn > 0);
    }
}
