use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::backend::{BackendFactory, GraphBackend};
use super::config::Options;
use super::orchestrator::TreeHouze;
use super::panel::{Input, Item, PanelEvent, PanelSpec};
use super::select::{PointerInput, SelectBox};
use super::state::PlanarSession;
use super::types::{Dim, GraphData};

type Shared = Rc<RefCell<Option<TreeHouze>>>;

/// Backends this build can put on a canvas. Only the planar one ships here;
/// volumetric and head-mounted modes need an external factory.
struct WebBackends {
	ctx: CanvasRenderingContext2d,
	size: Rc<Cell<(f64, f64)>>,
}

impl BackendFactory for WebBackends {
	fn create(&self, dim: Dim) -> Option<Box<dyn GraphBackend>> {
		match dim {
			Dim::TwoD => {
				let (w, h) = self.size.get();
				Some(Box::new(PlanarSession::new(Some(self.ctx.clone()), w, h)))
			}
			other => {
				warn!("no {other} renderer in this build");
				None
			}
		}
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(800.0),
		window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(600.0),
	)
}

/// Pointer position relative to the canvas.
fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<PointerInput> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some(PointerInput {
		x: ev.client_x() as f64 - rect.left(),
		y: ev.client_y() as f64 - rect.top(),
		modifier: ev.shift_key(),
		viewport: (rect.width(), rect.height()),
	})
}

/// Runs `f` against the orchestrator and republishes the select box.
fn with_house(state: &Shared, set_select_box: WriteSignal<Option<SelectBox>>, f: impl FnOnce(&mut TreeHouze)) {
	if let Some(ref mut house) = *state.borrow_mut() {
		f(house);
		set_select_box.set(house.select_box());
	}
}

#[component]
pub fn TreeHouzeCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] options: Option<Options>,
	/// id of the node that glows when glow is on
	#[prop(optional, into)]
	current: Option<String>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	/// receives the dataset when the panel's save button is pressed
	#[prop(optional)]
	on_save: Option<Callback<GraphData>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared = Rc::new(RefCell::new(None));
	let size = Rc::new(Cell::new((800.0, 600.0)));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (panel, set_panel) = signal(PanelSpec::default());
	let (select_box, set_select_box) = signal(None::<SelectBox>);
	let (state_init, animate_init, resize_cb_init) = (state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let graph = data.get();

		if state_init.borrow().is_none() {
			let Some(window) = web_sys::window() else {
				return;
			};
			let (w, h) = if fullscreen {
				window_size(&window)
			} else {
				(
					width.unwrap_or_else(|| {
						canvas
							.parent_element()
							.map(|p| p.client_width() as f64)
							.unwrap_or(800.0)
					}),
					height.unwrap_or_else(|| {
						canvas
							.parent_element()
							.map(|p| p.client_height() as f64)
							.unwrap_or(600.0)
					}),
				)
			};
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
			size.set((w, h));

			let Some(ctx) = canvas
				.get_context("2d")
				.ok()
				.flatten()
				.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
			else {
				error!("canvas has no 2d context");
				return;
			};
			let factory = WebBackends {
				ctx,
				size: size.clone(),
			};
			let mut house = TreeHouze::new(options.clone().unwrap_or_default(), Box::new(factory));
			if let Some(id) = current.clone() {
				house.set_current(move |node| node.id == id);
			}
			*state_init.borrow_mut() = Some(house);

			if fullscreen {
				let (state_resize, canvas_resize, size_resize) = (state_init.clone(), canvas.clone(), size.clone());
				*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
					let Some(win) = web_sys::window() else {
						return;
					};
					let (nw, nh) = window_size(&win);
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					size_resize.set((nw, nh));
					if let Some(ref mut house) = *state_resize.borrow_mut() {
						house.resize(nw, nh);
					}
				}));
				if let Some(ref cb) = *resize_cb_init.borrow() {
					let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}

			let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				if let Some(ref mut house) = *state_anim.borrow_mut() {
					house.tick(0.016);
				}
				if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}));
			if let Some(ref cb) = *animate_init.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}

		if let Some(ref mut house) = *state_init.borrow_mut() {
			let drawn = if house.is_drawn() {
				house.autosync(&graph)
			} else {
				house.draw(Some(&graph), None)
			};
			if let Err(err) = drawn {
				warn!("graph not drawn: {err}");
			}
			set_panel.set(house.panel());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		with_house(&state_md, set_select_box, |house| house.pointer_down(p));
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		with_house(&state_mm, set_select_box, |house| house.pointer_move(p));
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		with_house(&state_mu, set_select_box, |house| house.pointer_up(p));
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_house(&state_ml, set_select_box, |house| house.pointer_leave());
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		with_house(&state_wh, set_select_box, |house| house.wheel(p.x, p.y, ev.delta_y()));
	};

	let house = StoredValue::new_local(state);
	let dispatch = Callback::new(move |event: PanelEvent| {
		let saved = house.with_value(|state| {
			let mut state = state.borrow_mut();
			let inner = state.as_mut()?;
			let saved = inner.handle_panel(event);
			set_panel.set(inner.panel());
			saved
		});
		let Some(saved) = saved else {
			return;
		};
		match on_save {
			Some(on_save) => on_save.run(saved),
			None => match saved.to_json() {
				Ok(json) => info!("saved graph: {json}"),
				Err(err) => warn!("could not encode saved graph: {err}"),
			},
		}
	});

	view! {
		<div class="treehouze" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="treehouze-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				select_box
					.get()
					.map(|b| {
						view! {
							<div
								class="treehouze-select-box"
								style:position="absolute"
								style:pointer-events="none"
								style:left=format!("{}px", b.left)
								style:top=format!("{}px", b.top)
								style:width=format!("{}px", b.width)
								style:height=format!("{}px", b.height)
							/>
						}
					})
			}}
			<ControlPanel panel=panel dispatch=dispatch />
		</div>
	}
}

/// Renders a [`PanelSpec`] as plain form controls.
#[component]
pub fn ControlPanel(panel: ReadSignal<PanelSpec>, dispatch: Callback<PanelEvent>) -> impl IntoView {
	view! {
		<div class="treehouze-panel">
			{move || {
				panel
					.get()
					.tabs
					.into_iter()
					.map(|tab| {
						view! {
							<fieldset class="treehouze-tab">
								<legend>{tab.title}</legend>
								{tab.items.into_iter().map(|item| panel_item(item, dispatch)).collect_view()}
							</fieldset>
						}
					})
					.collect_view()
			}}
		</div>
	}
}

fn panel_item(item: Item, dispatch: Callback<PanelEvent>) -> AnyView {
	match item {
		Item::Input(input) => panel_input(input, dispatch),
		Item::Folder { title, inputs } => view! {
			<details class="treehouze-folder" open>
				<summary>{title}</summary>
				{inputs.into_iter().map(|input| panel_input(input, dispatch)).collect_view()}
			</details>
		}
		.into_any(),
	}
}

fn panel_input(input: Input, dispatch: Callback<PanelEvent>) -> AnyView {
	match input {
		Input::Toggle {
			label,
			switch,
			value,
			disabled,
		} => view! {
			<label class="treehouze-toggle">
				<input
					type="checkbox"
					prop:checked=value
					disabled=disabled
					on:change=move |ev| {
						if let Some(update) = switch.toggled(event_target_checked(&ev)) {
							dispatch.run(PanelEvent::Change(update));
						}
					}
				/>
				{label}
			</label>
		}
		.into_any(),
		Input::Choice {
			label,
			switch,
			options,
			value,
		} => view! {
			<label class="treehouze-choice">
				{label}
				<select on:change=move |ev| {
					match switch.chosen(&event_target_value(&ev)) {
						Ok(update) => dispatch.run(PanelEvent::Change(update)),
						Err(err) => warn!("{err}"),
					}
				}>
					{options
						.into_iter()
						.map(|(title, option)| {
							view! {
								<option value=option selected={option == value}>
									{title}
								</option>
							}
						})
						.collect_view()}
				</select>
			</label>
		}
		.into_any(),
		Input::Button {
			label,
			action,
			disabled,
		} => view! {
			<button class="treehouze-button" disabled=disabled on:click=move |_| dispatch.run(PanelEvent::Press(action))>
				{label}
			</button>
		}
		.into_any(),
	}
}
