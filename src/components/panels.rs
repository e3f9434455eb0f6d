//! Side panels: topology settings, node and link forms, link list.
//!
//! Every panel reads from and writes to the shared designer signal. Text inputs
//! bind their value with `prop:value` so typing never rebuilds the input, and
//! lists are keyed on a memoised length for the same reason.

use leptos::prelude::*;
use log::{debug, warn};

use crate::controller::{Designer, LinkForm, NodeForm, NodeFormMode};
use crate::error::{Field, Result};
use crate::handoff;
use crate::topology::model::{BindMount, KindTemplate, Position};

/// Where "Add node" drops a node when no canvas position is involved.
const TOOLBAR_DROP: Position = Position::new(120.0, 120.0);

fn report<T>(result: Result<T>) {
	if let Err(e) = result {
		warn!("clab-designer: {e}");
	}
}

/// A cleared template field turns its override off.
fn override_text(value: String) -> Option<String> {
	Some(value).filter(|v| !v.trim().is_empty())
}

fn edit_node_form(designer: RwSignal<Designer>, apply: impl FnOnce(&mut NodeForm)) {
	designer.update(|d| {
		if let Some(form) = d.node_form_mut() {
			apply(form);
		}
	});
}

fn edit_link_form(designer: RwSignal<Designer>, apply: impl FnOnce(&mut LinkForm)) {
	designer.update(|d| {
		if let Some(form) = d.link_form_mut() {
			apply(form);
		}
	});
}

/// Catalog kinds followed by any template-only kinds.
fn kind_names(designer: &Designer) -> Vec<String> {
	let mut names: Vec<String> = designer.config().catalog.kinds().map(str::to_string).collect();
	for template in &designer.store().settings().kinds {
		if !names.contains(&template.name) {
			names.push(template.name.clone());
		}
	}
	names
}

#[component]
pub fn Toolbar(designer: RwSignal<Designer>) -> impl IntoView {
	let kinds = Memo::new(move |_| designer.with(kind_names));
	let mgmt_enabled = move || designer.with(|d| d.store().settings().mgmt.enabled);
	let mgmt_text = move |get: fn(&Designer) -> String| move || designer.with(get);
	let notice = move || designer.with(|d| d.notice().map(|n| n.0.clone()));

	view! {
		<header class="toolbar">
			<label>
				"Topology "
				<input
					type="text"
					prop:value=mgmt_text(|d| d.store().settings().name.clone())
					on:change=move |ev| {
						let name = event_target_value(&ev);
						designer.update(|d| report(d.set_topology_name(&name)));
					}
				/>
			</label>
			<label>
				<input
					type="checkbox"
					prop:checked=mgmt_enabled
					on:change=move |ev| {
						let on = event_target_checked(&ev);
						designer.update(|d| report(d.set_mgmt_enabled(on)));
					}
				/>
				" Management network"
			</label>
			<Show when=mgmt_enabled>
				<input
					type="text"
					placeholder="network"
					prop:value=mgmt_text(|d| d.store().settings().mgmt.network.clone())
					on:change=move |ev| {
						let network = event_target_value(&ev);
						designer.update(|d| report(d.set_mgmt_network(&network)));
					}
				/>
				<input
					type="text"
					placeholder="IPv4 subnet, e.g. 172.20.20.0/24"
					prop:value=mgmt_text(|d| d.store().settings().mgmt.ipv4_subnet.clone())
					on:change=move |ev| {
						let subnet = event_target_value(&ev);
						designer.update(|d| report(d.set_ipv4_subnet(&subnet)));
					}
				/>
				<input
					type="text"
					placeholder="IPv6 subnet"
					prop:value=mgmt_text(|d| d.store().settings().mgmt.ipv6_subnet.clone())
					on:change=move |ev| {
						let subnet = event_target_value(&ev);
						designer.update(|d| report(d.set_ipv6_subnet(&subnet)));
					}
				/>
			</Show>
			<label>
				"Default kind "
				<select on:change=move |ev| {
					let kind = event_target_value(&ev);
					designer.update(|d| report(d.set_default_kind(Some(&kind))));
				}>
					<option value="">"(none)"</option>
					{move || {
						kinds
							.get()
							.into_iter()
							.map(|kind| {
								let current = kind.clone();
								let selected = move || {
									designer
										.with(|d| d.store().settings().default_kind.as_deref() == Some(current.as_str()))
								};
								let label = kind.clone();
								view! { <option value=kind selected=selected>{label}</option> }
							})
							.collect_view()
					}}
				</select>
			</label>
			<button on:click=move |_| designer.update(|d| d.open_node_form(TOOLBAR_DROP))>"Add node"</button>
			<button on:click=move |_| designer.update(Designer::reset)>"Reset"</button>
		</header>
		{move || {
			notice()
				.map(|text| {
					view! {
						<div class="notice">
							<span>{text}</span>
							<button on:click=move |_| designer.update(Designer::dismiss_notice)>"Dismiss"</button>
						</div>
					}
				})
		}}
	}
}

#[component]
pub fn NodeFormPanel(designer: RwSignal<Designer>) -> impl IntoView {
	let is_open = move || designer.with(|d| d.node_form().is_some());
	let form_text =
		move |get: fn(&NodeForm) -> String| move || designer.with(|d| d.node_form().map(get).unwrap_or_default());
	let original = move || {
		designer.with(|d| match d.node_form().map(|f| &f.mode) {
			Some(NodeFormMode::Modify { original }) => Some(original.clone()),
			_ => None,
		})
	};
	let creating = move || original().is_none();
	let bulk = move || designer.with(|d| d.node_form().is_some_and(NodeForm::is_bulk));
	let warned = move |field: Field| {
		move || designer.with(|d| d.node_form().and_then(|f| f.warning.as_ref()).and_then(|w| w.field) == Some(field))
	};
	let warning = move || designer.with(|d| d.node_form().and_then(|f| f.warning.as_ref()).map(|w| w.message.clone()));
	let mgmt_enabled = move || designer.with(|d| d.store().settings().mgmt.enabled);

	let kinds = Memo::new(move |_| designer.with(kind_names));
	let images = Memo::new(move |_| {
		designer.with(|d| {
			d.node_form()
				.map(|f| d.config().catalog.images(&f.kind).to_vec())
				.unwrap_or_default()
		})
	});
	let bind_count = Memo::new(move |_| designer.with(|d| d.node_form().map_or(0, |f| f.binds.len())));
	let env_count = Memo::new(move |_| designer.with(|d| d.node_form().map_or(0, |f| f.env.len())));

	let submit = move |_| {
		designer.update(|d| match d.submit_node_form() {
			Ok(ids) => debug!("clab-designer: node form committed {ids:?}"),
			Err(e) => debug!("clab-designer: node form rejected: {e}"),
		});
	};
	let delete = move |_| {
		if let Some(id) = original() {
			designer.update(|d| {
				report(d.remove_node(&id));
				d.cancel_node_form();
			});
		}
	};

	view! {
		<Show when=is_open>
			<section class="panel node-form">
				<h2>{move || original().map_or_else(|| "New node".to_string(), |id| format!("Edit {id}"))}</h2>
				<Show when=creating>
					<label>
						"Count "
						<input
							type="number"
							min="1"
							max="100"
							class:invalid=warned(Field::Count)
							prop:value=form_text(|f| f.count.to_string())
							on:input=move |ev| {
								let count = event_target_value(&ev).trim().parse::<usize>().unwrap_or(0);
								edit_node_form(designer, move |f| f.count = count);
							}
						/>
					</label>
				</Show>
				<Show
					when=bulk
					fallback=move || {
						view! {
							<label>
								"Name "
								<input
									type="text"
									class:invalid=warned(Field::Name)
									prop:value=form_text(|f| f.name.clone())
									on:input=move |ev| {
										let name = event_target_value(&ev);
										edit_node_form(designer, move |f| f.name = name);
									}
								/>
							</label>
						}
					}
				>
					<label>
						"Name prefix "
						<input
							type="text"
							class:invalid=warned(Field::NamePrefix)
							prop:value=form_text(|f| f.prefix.clone())
							on:input=move |ev| {
								let prefix = event_target_value(&ev);
								edit_node_form(designer, move |f| f.prefix = prefix);
							}
						/>
					</label>
				</Show>
				<label>
					"Kind "
					<select
						class:invalid=warned(Field::Kind)
						on:change=move |ev| {
							let kind = event_target_value(&ev);
							edit_node_form(
								designer,
								move |f| {
									f.kind = kind;
									f.image.clear();
								},
							);
						}
					>
						<option value="">"(choose)"</option>
						{move || {
							kinds
								.get()
								.into_iter()
								.map(|kind| {
									let current = kind.clone();
									let selected = move || {
										designer.with(|d| d.node_form().is_some_and(|f| f.kind == current))
									};
									let label = kind.clone();
									view! { <option value=kind selected=selected>{label}</option> }
								})
								.collect_view()
						}}
					</select>
				</label>
				<label>
					"Image "
					{move || {
						let listed = images.get();
						if listed.is_empty() {
							view! {
								<input
									type="text"
									class:invalid=warned(Field::Image)
									prop:value=form_text(|f| f.image.clone())
									on:input=move |ev| {
										let image = event_target_value(&ev);
										edit_node_form(designer, move |f| f.image = image);
									}
								/>
							}
								.into_any()
						} else {
							view! {
								<select
									class:invalid=warned(Field::Image)
									on:change=move |ev| {
										let image = event_target_value(&ev);
										edit_node_form(designer, move |f| f.image = image);
									}
								>
									<option value="">"(template or none)"</option>
									{listed
										.into_iter()
										.map(|image| {
											let current = image.clone();
											let selected = move || {
												designer.with(|d| d.node_form().is_some_and(|f| f.image == current))
											};
											let label = image.clone();
											view! { <option value=image selected=selected>{label}</option> }
										})
										.collect_view()}
								</select>
							}
								.into_any()
						}
					}}
				</label>
				<label>
					"Startup config "
					<input
						type="text"
						prop:value=form_text(|f| f.startup_config.clone())
						on:input=move |ev| {
							let path = event_target_value(&ev);
							edit_node_form(designer, move |f| f.startup_config = path);
						}
					/>
				</label>
				<Show when=mgmt_enabled>
					<label>
						{move || if bulk() { "IPv4 base " } else { "IPv4 " }}
						<input
							type="text"
							class:invalid=warned(Field::MgmtAddress)
							prop:value=form_text(|f| f.mgmt_ipv4.clone())
							on:input=move |ev| {
								let address = event_target_value(&ev);
								edit_node_form(designer, move |f| f.mgmt_ipv4 = address);
							}
						/>
					</label>
					<label>
						{move || if bulk() { "IPv6 base " } else { "IPv6 " }}
						<input
							type="text"
							prop:value=form_text(|f| f.mgmt_ipv6.clone())
							on:input=move |ev| {
								let address = event_target_value(&ev);
								edit_node_form(designer, move |f| f.mgmt_ipv6 = address);
							}
						/>
					</label>
				</Show>
				<fieldset>
					<legend>"Binds"</legend>
					{move || (0..bind_count.get()).map(|i| bind_row(designer, i)).collect_view()}
					<button on:click=move |_| {
						edit_node_form(designer, |f| f.binds.push(BindMount::default()))
					}>"Add bind"</button>
				</fieldset>
				<fieldset>
					<legend>"Environment"</legend>
					{move || (0..env_count.get()).map(|i| env_row(designer, i)).collect_view()}
					<button on:click=move |_| {
						edit_node_form(designer, |f| f.env.push((String::new(), String::new())))
					}>"Add variable"</button>
				</fieldset>
				{move || warning().map(|message| view! { <p class="warning">{message}</p> })}
				<div class="actions">
					<button on:click=submit>"Save"</button>
					<button on:click=move |_| designer.update(Designer::cancel_node_form)>"Cancel"</button>
					<Show when=move || !creating()>
						<button class="danger" on:click=delete>"Delete node"</button>
					</Show>
				</div>
			</section>
		</Show>
	}
}

fn bind_row(designer: RwSignal<Designer>, index: usize) -> impl IntoView {
	let part = move |get: fn(&BindMount) -> String| {
		move || designer.with(|d| d.node_form().and_then(|f| f.binds.get(index)).map(get).unwrap_or_default())
	};
	view! {
		<div class="row">
			<input
				type="text"
				placeholder="host path"
				prop:value=part(|b| b.source.clone())
				on:input=move |ev| {
					let source = event_target_value(&ev);
					edit_node_form(
						designer,
						move |f| {
							if let Some(bind) = f.binds.get_mut(index) {
								bind.source = source;
							}
						},
					);
				}
			/>
			":"
			<input
				type="text"
				placeholder="container path"
				prop:value=part(|b| b.target.clone())
				on:input=move |ev| {
					let target = event_target_value(&ev);
					edit_node_form(
						designer,
						move |f| {
							if let Some(bind) = f.binds.get_mut(index) {
								bind.target = target;
							}
						},
					);
				}
			/>
			<button on:click=move |_| {
				edit_node_form(
					designer,
					move |f| {
						if index < f.binds.len() {
							f.binds.remove(index);
						}
					},
				)
			}>"Remove"</button>
		</div>
	}
}

fn env_row(designer: RwSignal<Designer>, index: usize) -> impl IntoView {
	let part = move |get: fn(&(String, String)) -> String| {
		move || designer.with(|d| d.node_form().and_then(|f| f.env.get(index)).map(get).unwrap_or_default())
	};
	view! {
		<div class="row">
			<input
				type="text"
				placeholder="NAME"
				prop:value=part(|(k, _)| k.clone())
				on:input=move |ev| {
					let key = event_target_value(&ev);
					edit_node_form(
						designer,
						move |f| {
							if let Some(entry) = f.env.get_mut(index) {
								entry.0 = key;
							}
						},
					);
				}
			/>
			"="
			<input
				type="text"
				placeholder="value"
				prop:value=part(|(_, v)| v.clone())
				on:input=move |ev| {
					let value = event_target_value(&ev);
					edit_node_form(
						designer,
						move |f| {
							if let Some(entry) = f.env.get_mut(index) {
								entry.1 = value;
							}
						},
					);
				}
			/>
			<button on:click=move |_| {
				edit_node_form(
					designer,
					move |f| {
						if index < f.env.len() {
							f.env.remove(index);
						}
					},
				)
			}>"Remove"</button>
		</div>
	}
}

#[component]
pub fn LinkFormPanel(designer: RwSignal<Designer>) -> impl IntoView {
	let is_open = move || designer.with(|d| d.link_form().is_some());
	let form_text =
		move |get: fn(&LinkForm) -> String| move || designer.with(|d| d.link_form().map(get).unwrap_or_default());
	let link_id = move || designer.with(|d| d.link_form().and_then(|f| f.link_id().map(str::to_string)));
	let warned = move |field: Field| {
		move || designer.with(|d| d.link_form().and_then(|f| f.warning.as_ref()).and_then(|w| w.field) == Some(field))
	};
	let warning = move || designer.with(|d| d.link_form().and_then(|f| f.warning.as_ref()).map(|w| w.message.clone()));

	let submit = move |_| {
		designer.update(|d| match d.submit_link_form() {
			Ok(id) => debug!("clab-designer: link form committed {id}"),
			Err(e) => debug!("clab-designer: link form rejected: {e}"),
		});
	};
	let delete = move |_| {
		if let Some(id) = link_id() {
			designer.update(|d| {
				report(d.remove_link(&id));
				d.cancel_link_form();
			});
		}
	};

	view! {
		<Show when=is_open>
			<section class="panel link-form">
				<h2>{move || if link_id().is_some() { "Edit link" } else { "New link" }}</h2>
				<label>
					{form_text(|f| f.source.clone())}
					" "
					<input
						type="text"
						class:invalid=warned(Field::SourceInterface)
						prop:value=form_text(|f| f.source_interface.clone())
						on:input=move |ev| {
							let interface = event_target_value(&ev);
							edit_link_form(designer, move |f| f.source_interface = interface);
						}
					/>
				</label>
				<label>
					{form_text(|f| f.target.clone())}
					" "
					<input
						type="text"
						class:invalid=warned(Field::TargetInterface)
						prop:value=form_text(|f| f.target_interface.clone())
						on:input=move |ev| {
							let interface = event_target_value(&ev);
							edit_link_form(designer, move |f| f.target_interface = interface);
						}
					/>
				</label>
				{move || warning().map(|message| view! { <p class="warning">{message}</p> })}
				<div class="actions">
					<button on:click=submit>"Save"</button>
					<button on:click=move |_| designer.update(Designer::cancel_link_form)>"Cancel"</button>
					<Show when=move || link_id().is_some()>
						<button class="danger" on:click=delete>"Delete link"</button>
					</Show>
				</div>
			</section>
		</Show>
	}
}

/// Every link with edit and remove actions.
#[component]
pub fn LinkList(designer: RwSignal<Designer>) -> impl IntoView {
	let links = Memo::new(move |_| {
		designer.with(|d| {
			d.store()
				.links()
				.iter()
				.map(|l| (l.id.clone(), format!("{} <-> {}", l.source_endpoint(), l.target_endpoint())))
				.collect::<Vec<_>>()
		})
	});

	view! {
		<section class="panel link-list">
			<h2>"Links"</h2>
			<ul>
				{move || {
					links
						.get()
						.into_iter()
						.map(|(id, label)| {
							let edit_id = id.clone();
							view! {
								<li>
									<span>{label}</span>
									<button on:click=move |_| {
										designer.update(|d| report(d.open_modify_link(&edit_id)))
									}>"Edit"</button>
									<button on:click=move |_| designer.update(|d| report(d.remove_link(&id)))>
										"Remove"
									</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</section>
	}
}

/// Kind templates declared in the topology's `kinds` section.
#[component]
pub fn KindPanel(designer: RwSignal<Designer>) -> impl IntoView {
	let templates = Memo::new(move |_| designer.with(|d| d.store().settings().kinds.clone()));
	let draft = RwSignal::new(KindTemplate::default());

	view! {
		<section class="panel kinds">
			<h2>"Kinds"</h2>
			<ul>
				{move || {
					templates
						.get()
						.into_iter()
						.map(|template| {
							let name = template.name.clone();
							view! {
								<li>
									<span>{template.name}</span>
									" "
									<span class="muted">{template.image.unwrap_or_default()}</span>
									<button on:click=move |_| designer.update(|d| report(d.remove_kind(&name)))>
										"Remove"
									</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
			<div class="row">
				<input
					type="text"
					placeholder="kind"
					prop:value=move || draft.with(|t| t.name.clone())
					on:input=move |ev| {
						let name = event_target_value(&ev);
						draft.update(|t| t.name = name);
					}
				/>
				<input
					type="text"
					placeholder="image"
					prop:value=move || draft.with(|t| t.image.clone().unwrap_or_default())
					on:input=move |ev| {
						let image = event_target_value(&ev);
						draft.update(|t| t.image = override_text(image));
					}
				/>
				<input
					type="text"
					placeholder="startup config"
					prop:value=move || draft.with(|t| t.startup_config.clone().unwrap_or_default())
					on:input=move |ev| {
						let path = event_target_value(&ev);
						draft.update(|t| t.startup_config = override_text(path));
					}
				/>
				<button on:click=move |_| {
					let template = draft.get_untracked();
					let mut saved = false;
					designer
						.update(|d| match d.upsert_kind(template) {
							Ok(()) => saved = true,
							Err(e) => warn!("clab-designer: {e}"),
						});
					if saved {
						draft.set(KindTemplate::default());
					}
				}>"Save kind"</button>
			</div>
		</section>
	}
}

/// Deploy and export buttons; payloads go to the page as DOM events.
#[component]
pub fn HandoffPanel(designer: RwSignal<Designer>) -> impl IntoView {
	let server = RwSignal::new(String::new());
	let invalid = move || designer.with(|d| d.store().document().is_invalid());

	let deploy = move |_| {
		let target = server.get_untracked();
		let request = designer.with_untracked(|d| handoff::deploy_request(d, &target));
		report(request.and_then(|r| handoff::dispatch(handoff::DEPLOY_EVENT, &r)));
	};
	let export = move |_| {
		let request = designer.with_untracked(handoff::export_request);
		report(request.and_then(|r| handoff::dispatch(handoff::EXPORT_EVENT, &r)));
	};

	view! {
		<section class="panel handoff">
			<input
				type="text"
				placeholder="target server"
				prop:value=move || server.get()
				on:input=move |ev| server.set(event_target_value(&ev))
			/>
			<button disabled=invalid on:click=deploy>"Deploy"</button>
			<button disabled=invalid on:click=export>"Export"</button>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cleared_template_field_disables_override() {
		assert_eq!(override_text("ceos:4.32".into()).as_deref(), Some("ceos:4.32"));
		assert_eq!(override_text("  ".into()), None);
		assert_eq!(override_text(String::new()), None);
	}
}
