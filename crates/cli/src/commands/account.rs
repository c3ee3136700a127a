//! Profile and address commands.

use clap::{Args, Subcommand};
use sstashed_core::{AddressId, AddressType};
use sstashed_storefront::Storefront;
use sstashed_storefront::gateway::types::{Address, AddressInput, ProfileUpdate};

use super::{CliError, json, line};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the signed-in profile
    Show,
    /// Update name and phone
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AddressAction {
    /// List saved addresses
    List,
    /// Show the default address
    Default,
    /// Save a new address
    Add(AddressArgs),
    /// Replace a saved address
    Update {
        id: String,
        #[command(flatten)]
        address: AddressArgs,
    },
    /// Delete a saved address
    Delete { id: String },
}

#[derive(Args)]
pub struct AddressArgs {
    #[arg(long)]
    street: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long, default_value = "India")]
    country: String,
    /// home, work or other
    #[arg(long = "type", default_value = "home")]
    address_type: String,
    /// Make this the default delivery address
    #[arg(long)]
    default: bool,
}

impl TryFrom<AddressArgs> for AddressInput {
    type Error = CliError;

    fn try_from(args: AddressArgs) -> Result<Self, Self::Error> {
        let address_type: AddressType = args
            .address_type
            .parse()
            .map_err(CliError::InvalidArgument)?;
        Ok(Self {
            street_address: args.street,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
            address_type,
            is_default: args.default,
        })
    }
}

pub async fn profile(
    storefront: &Storefront,
    action: ProfileAction,
    as_json: bool,
) -> Result<(), CliError> {
    let client = storefront.client();
    let profile = match action {
        ProfileAction::Show => client.get_profile().await?,
        ProfileAction::Update {
            first_name,
            last_name,
            phone,
        } => {
            let current = client.get_profile().await?;
            let update = ProfileUpdate {
                first_name: first_name.unwrap_or(current.first_name),
                last_name: last_name.unwrap_or(current.last_name),
                phone: phone.or(current.phone).filter(|p| !p.trim().is_empty()),
            };
            client.update_profile(&update).await?
        }
    };

    if as_json {
        return json(&profile);
    }
    line(format!("{} <{}>", profile.full_name(), profile.email))?;
    if let Some(phone) = &profile.phone {
        line(format!("phone: {phone}"))?;
    }
    line(format!("role: {}", profile.role))
}

pub async fn addresses(
    storefront: &Storefront,
    action: AddressAction,
    as_json: bool,
) -> Result<(), CliError> {
    let client = storefront.client();
    let addresses = match action {
        AddressAction::List => client.list_addresses().await?,
        AddressAction::Default => client.default_address().await?.into_iter().collect(),
        AddressAction::Add(args) => vec![client.add_address(&args.try_into()?).await?],
        AddressAction::Update { id, address } => {
            vec![
                client
                    .update_address(&AddressId::from(id), &address.try_into()?)
                    .await?,
            ]
        }
        AddressAction::Delete { id } => {
            client.delete_address(&AddressId::from(id.as_str())).await?;
            return line(format!("Address {id} deleted"));
        }
    };

    if as_json {
        return json(&addresses);
    }
    if addresses.is_empty() {
        return line("No saved addresses");
    }
    for address in &addresses {
        print_address(address)?;
    }
    Ok(())
}

fn print_address(address: &Address) -> Result<(), CliError> {
    let marker = if address.is_default { " (default)" } else { "" };
    line(format!(
        "{:>6}  {}, {}, {} {}, {}{marker}",
        address.id,
        address.street_address,
        address.city,
        address.state,
        address.postal_code,
        address.country
    ))
}
