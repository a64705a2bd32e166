use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{now_utc, parse_contact_id};
use anyhow::Result;
use callsheet_core::domain::{CallStatus, TagName};
use callsheet_core::dto::ContactListItemDto;
use callsheet_store::query::ContactQuery;
use clap::Args;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only contacts carrying every given tag
    #[arg(long, value_name = "TAG")]
    pub tag: Vec<String>,
    /// Only contacts with this call status
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Debug, Args)]
pub struct SetStatusArgs {
    pub id: String,
    /// not_checked, no_answer, call_later, agreed, refused, donated or follow_up
    pub status: String,
}

pub fn list_contacts(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    let mut query = ContactQuery::default();
    for raw in &args.tag {
        query = query.with_tag(TagName::new(raw)?);
    }
    if let Some(raw) = args.status.as_deref() {
        query = query.with_status(raw.parse::<CallStatus>()?);
    }

    let contacts = ctx.store.contacts().list(&query)?;
    let contact_ids = contacts
        .iter()
        .map(|contact| contact.id)
        .collect::<Vec<_>>();
    let mut tags_by_contact = ctx.store.tags().list_names_for_contacts(&contact_ids)?;

    let items: Vec<ContactListItemDto> = contacts
        .into_iter()
        .map(|contact| ContactListItemDto {
            tags: tags_by_contact.remove(&contact.id).unwrap_or_default(),
            id: contact.id,
            full_name: contact.full_name,
            phone: contact.phone_e164.or(contact.phone_raw),
            call_status: contact.call_status,
            source: contact.source,
        })
        .collect();

    if ctx.json {
        print_json(&items)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("no contacts");
        return Ok(());
    }

    for item in items {
        let phone = item.phone.as_deref().unwrap_or("-");
        let tag_suffix = if item.tags.is_empty() {
            String::new()
        } else {
            let tags = item
                .tags
                .iter()
                .map(|tag| format!("#{}", tag))
                .collect::<Vec<_>>()
                .join(" ");
            format!(" {}", tags)
        };
        println!(
            "{}  {}  {}  [{}]{}",
            item.id,
            item.full_name,
            phone,
            item.call_status.as_str(),
            tag_suffix
        );
    }
    Ok(())
}

pub fn set_status(ctx: &Context<'_>, args: SetStatusArgs) -> Result<()> {
    let id = parse_contact_id(&args.id).map_err(|err| invalid_input(err.to_string()))?;
    let status = args.status.parse::<CallStatus>()?;
    if !ctx.store.contacts().exists(id)? {
        return Err(not_found(format!("contact {id}")));
    }
    let contact = ctx.store.contacts().set_call_status(now_utc(), id, status)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "id": contact.id,
            "call_status": contact.call_status,
        }));
    }
    println!("{} marked {}", contact.full_name, contact.call_status.as_str());
    Ok(())
}
