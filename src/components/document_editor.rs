//! Text view of the topology document.
//!
//! Shows the editable copy. Every keystroke is offered to the designer; text
//! that parses replaces the graph, text that does not is kept as typed and
//! flagged until it is fixed.

use leptos::prelude::*;

use crate::controller::Designer;

#[component]
pub fn DocumentEditor(designer: RwSignal<Designer>) -> impl IntoView {
	let text = move || designer.with(|d| d.store().document().editable.clone());
	let error = move || designer.with(|d| d.store().document().error.clone());

	view! {
		<section class="panel document-editor">
			<h2>"Topology document"</h2>
			<textarea
				spellcheck="false"
				class:invalid=move || error().is_some()
				prop:value=text
				on:input=move |ev| {
					let text = event_target_value(&ev);
					designer
						.update(|d| {
							let _ = d.edit_document(&text);
						});
				}
			/>
			{move || error().map(|message| view! { <p class="warning">{message}</p> })}
		</section>
	}
}
