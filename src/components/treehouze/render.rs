use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::backend::Scene;
use super::color::NODE_RADIUS;
use super::graph::NodeIx;
use super::state::PlanarSession;

pub fn render(session: &PlanarSession, scene: &Scene<'_>, ctx: &CanvasRenderingContext2d) {
	match &scene.config.background {
		Some(background) => {
			ctx.set_fill_style_str(background);
			ctx.fill_rect(0.0, 0.0, session.width, session.height);
		}
		None => ctx.clear_rect(0.0, 0.0, session.width, session.height),
	}
	ctx.save();
	let _ = ctx.translate(session.transform.x, session.transform.y);
	let _ = ctx.scale(session.transform.k, session.transform.k);
	draw_links(session, scene, ctx);
	draw_nodes(session, scene, ctx);
	ctx.restore();
}

fn draw_links(session: &PlanarSession, scene: &Scene<'_>, ctx: &CanvasRenderingContext2d) {
	let k = session.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 6.0 / k);
	let dash_offset = -(session.flow_time * 30.0) % (dash + gap);
	let particles = scene.config.particles.as_ref();

	for ix in scene.graph.link_ixs() {
		let link = scene.graph.link(ix);
		let (a, b) = (scene.graph.node(link.source), scene.graph.node(link.target));
		let (x1, y1, x2, y2) = (a.x(), a.y(), b.x(), b.y());
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);

		ctx.set_stroke_style_str(&scene.config.link_color);
		ctx.set_line_width(line_width);
		ctx.begin_path();
		ctx.move_to(x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
		ctx.line_to(x2 - ux * (NODE_RADIUS + arrow_size), y2 - uy * (NODE_RADIUS + arrow_size));
		ctx.stroke();

		// particles flow along highlighted links only
		let flow = scene.particle_width(ix);
		if let Some(particles) = particles.filter(|_| flow > 0.0) {
			ctx.set_stroke_style_str(&particles.color);
			ctx.set_line_width(flow / k);
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
			ctx.begin_path();
			ctx.move_to(x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
			ctx.line_to(x2 - ux * (NODE_RADIUS + arrow_size), y2 - uy * (NODE_RADIUS + arrow_size));
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.set_fill_style_str(&scene.config.link_color);
		let (tip_x, tip_y) = (x2 - ux * NODE_RADIUS, y2 - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(session: &PlanarSession, scene: &Scene<'_>, ctx: &CanvasRenderingContext2d) {
	let k = session.transform.k;
	let palette = scene.palette;

	for ix in scene.graph.node_ixs() {
		let node = scene.graph.node(ix);
		let sprite = scene.sprite(ix);
		let look = &sprite.look;
		let (x, y) = (node.x(), node.y());

		ctx.set_global_alpha(look.alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, look.radius, 0.0, 2.0 * PI);
		if let Some(glow) = &sprite.glow {
			ctx.set_shadow_blur(glow.blur);
			ctx.set_shadow_color(&glow.color);
		}
		ctx.set_fill_style_str(&sprite.color);
		ctx.fill();
		if sprite.glow.is_some() {
			ctx.set_shadow_blur(0.0);
			ctx.set_shadow_color("transparent");
		}

		ctx.set_stroke_style_str(&palette.band);
		ctx.set_line_width(look.band_width());
		ctx.stroke();

		if scene.config.node_label && look.labelled {
			draw_label(scene, ix, look.radius, look.label_alpha, k, ctx);
		}
		ctx.set_global_alpha(1.0);
	}
}

fn draw_label(
	scene: &Scene<'_>,
	ix: NodeIx,
	radius: f64,
	alpha: f64,
	k: f64,
	ctx: &CanvasRenderingContext2d,
) {
	let node = scene.graph.node(ix);
	ctx.set_global_alpha(alpha);
	ctx.set_fill_style_str(&scene.palette.text);
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	let _ = ctx.fill_text(&node.label, node.x() + radius + 1.0, node.y() + radius + 1.0);
}
