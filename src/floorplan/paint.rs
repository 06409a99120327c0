//! Replays a [`Scene`] onto an `egui::Painter`

use egui::epaint::Vertex;
use egui::{Color32, FontId, Painter, Pos2, Rect, Shape, Vec2};

use super::colors;
use super::render::{DrawCommand, Scene};

const TOOLTIP_PADDING: f32 = 6.0;

/// Paint `scene` with its canvas origin at `origin` (screen coordinates)
pub fn paint_scene(painter: &Painter, origin: Vec2, scene: &Scene) {
    for command in &scene.commands {
        paint_command(painter, origin, command);
    }
}

fn paint_command(painter: &Painter, origin: Vec2, command: &DrawCommand) {
    match command {
        DrawCommand::Rect {
            rect,
            rounding,
            fill,
            stroke,
        } => {
            painter.rect(rect.translate(origin), *rounding, *fill, *stroke);
        }
        DrawCommand::Polygon {
            points,
            fill,
            stroke,
        } => {
            let points = points.iter().map(|p| *p + origin).collect();
            painter.add(Shape::convex_polygon(points, *fill, *stroke));
        }
        DrawCommand::Polyline {
            points,
            closed,
            stroke,
        } => {
            let points: Vec<Pos2> = points.iter().map(|p| *p + origin).collect();
            if *closed {
                painter.add(Shape::closed_line(points, *stroke));
            } else {
                painter.add(Shape::line(points, *stroke));
            }
        }
        DrawCommand::Text {
            pos,
            anchor,
            text,
            size,
            color,
        } => {
            painter.text(*pos + origin, *anchor, text, FontId::proportional(*size), *color);
        }
        DrawCommand::Image { texture, corners } => {
            let uvs = [
                Pos2::new(0.0, 0.0),
                Pos2::new(1.0, 0.0),
                Pos2::new(1.0, 1.0),
                Pos2::new(0.0, 1.0),
            ];
            let mut mesh = egui::Mesh::with_texture(*texture);
            for (corner, uv) in corners.iter().zip(uvs) {
                mesh.vertices.push(Vertex {
                    pos: *corner + origin,
                    uv,
                    color: Color32::WHITE,
                });
            }
            mesh.add_triangle(0, 1, 2);
            mesh.add_triangle(0, 2, 3);
            painter.add(Shape::mesh(mesh));
        }
        DrawCommand::Tooltip { anchor, lines } => {
            paint_tooltip(painter, *anchor + origin, lines);
        }
    }
}

fn paint_tooltip(painter: &Painter, anchor: Pos2, lines: &[String]) {
    let galley = painter.layout_no_wrap(
        lines.join("\n"),
        FontId::proportional(12.0),
        colors::TOOLTIP_TEXT,
    );
    let size = galley.size() + Vec2::splat(2.0 * TOOLTIP_PADDING);
    let clip = painter.clip_rect();

    // keep inside the canvas
    let mut min = anchor;
    if min.x + size.x > clip.max.x {
        min.x = (clip.max.x - size.x).max(clip.min.x);
    }
    if min.y + size.y > clip.max.y {
        min.y = (clip.max.y - size.y).max(clip.min.y);
    }

    let rect = Rect::from_min_size(min, size);
    painter.rect_filled(rect, 4.0, colors::TOOLTIP_BG);
    painter.galley(
        rect.min + Vec2::splat(TOOLTIP_PADDING),
        galley,
        colors::TOOLTIP_TEXT,
    );
}
