//! Cart lines given on the command line, as `id[:size][:qty][+addon…]`.
//!
//! `201` is one of item 201 in its default size. `201:Large:2+Cheese+Bacon` is two large ones with cheese and bacon.
//! `301:3` is three of item 301: a lone number after the id is a quantity, not a size.
use std::str::FromStr;

use anyhow::{anyhow, Result};
use storefront_engine::{data_types::CartItem, Catalog};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub id: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub add_ons: Vec<String>,
}

impl FromStr for ItemSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('+');
        let base = parts.next().unwrap_or_default();
        let add_ons = parts
            .map(|a| {
                let a = a.trim();
                if a.is_empty() {
                    Err(anyhow!("Empty add-on name in '{s}'"))
                } else {
                    Ok(a.to_string())
                }
            })
            .collect::<Result<Vec<String>>>()?;
        let fields = base.split(':').map(str::trim).collect::<Vec<&str>>();
        let (id, size, quantity) = match fields.as_slice() {
            [id] => (*id, None, None),
            [id, x] => match x.parse::<u32>() {
                Ok(q) => (*id, None, Some(q)),
                Err(_) => (*id, Some(*x), None),
            },
            [id, size, qty] => {
                let q = qty.parse::<u32>().map_err(|_| anyhow!("'{qty}' is not a quantity in '{s}'"))?;
                (*id, Some(*size), Some(q))
            },
            _ => return Err(anyhow!("'{s}' has too many fields. Use id[:size][:qty][+addon...]")),
        };
        if id.is_empty() {
            return Err(anyhow!("'{s}' has no menu item id"));
        }
        let quantity = quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(anyhow!("Quantity must be at least 1 in '{s}'"));
        }
        let size = size.filter(|s| !s.is_empty()).map(String::from);
        Ok(Self { id: id.to_string(), size, quantity, add_ons })
    }
}

impl ItemSpec {
    /// Prices this line against the menu. Size and add-on names are matched without regard to case.
    pub fn to_cart_item(&self, catalog: &Catalog) -> Result<CartItem> {
        let item = catalog.find(&self.id).ok_or_else(|| anyhow!("Menu item {} is not on the menu", self.id))?;
        let size = match &self.size {
            Some(wanted) => {
                let size = item.sizes.iter().find(|s| s.name.eq_ignore_ascii_case(wanted)).ok_or_else(|| {
                    let offered = item.sizes.iter().map(|s| s.name.as_str()).collect::<Vec<&str>>();
                    anyhow!("{} does not come in size '{wanted}'. Sizes: {}", item.name, list_or_none(&offered))
                })?;
                Some(size.name.as_str())
            },
            None => item.default_size(),
        };
        let add_ons = self
            .add_ons
            .iter()
            .map(|wanted| {
                item.available_add_ons.iter().find(|a| a.name.eq_ignore_ascii_case(wanted)).map(|a| a.name.as_str()).ok_or_else(
                    || {
                        let offered = item.available_add_ons.iter().map(|a| a.name.as_str()).collect::<Vec<&str>>();
                        anyhow!("'{wanted}' is not an add-on for {}. Add-ons: {}", item.name, list_or_none(&offered))
                    },
                )
            })
            .collect::<Result<Vec<&str>>>()?;
        Ok(CartItem::configure(item, size, &add_ons, self.quantity))
    }
}

fn list_or_none(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod test {
    use sf_common::Price;
    use storefront_engine::data_types::{AddOn, MenuItem, MenuItemId, SizeOption};

    use super::*;

    fn spec(s: &str) -> ItemSpec {
        s.parse().unwrap()
    }

    fn catalog() -> Catalog {
        let burger = MenuItem {
            id: MenuItemId::from("201"),
            name: "Quarter Pounder".into(),
            description: String::new(),
            category: "Burgers".into(),
            base_price: Price::new(5.0),
            image: String::new(),
            sizes: vec![
                SizeOption { name: "Regular".into(), price: Price::new(0.0) },
                SizeOption { name: "Large".into(), price: Price::new(1.5) },
            ],
            available_add_ons: vec![AddOn::new(Some(1), "Cheese", Price::new(0.5))],
        };
        Catalog::from_items(vec![burger])
    }

    #[test]
    fn parsing() {
        assert_eq!(spec("201"), ItemSpec { id: "201".into(), size: None, quantity: 1, add_ons: vec![] });
        assert_eq!(spec("301:3").quantity, 3);
        assert_eq!(spec("301:3").size, None);
        assert_eq!(spec("201:Large").size.as_deref(), Some("Large"));
        let full = spec("201:Large:2+Cheese+Make it a Meal Deal");
        assert_eq!(full.size.as_deref(), Some("Large"));
        assert_eq!(full.quantity, 2);
        assert_eq!(full.add_ons, vec!["Cheese", "Make it a Meal Deal"]);
        assert_eq!(spec("201::2").size, None);
    }

    #[test]
    fn bad_specs() {
        for s in ["", ":2", "201:Large:two", "201:0", "201+", "201:a:1:2"] {
            assert!(s.parse::<ItemSpec>().is_err(), "'{s}' should not parse");
        }
    }

    #[test]
    fn resolving_against_the_menu() {
        let catalog = catalog();
        let line = spec("201:large:2+cheese").to_cart_item(&catalog).unwrap();
        assert_eq!(line.size.as_deref(), Some("Large"));
        assert_eq!(line.add_ons.len(), 1);
        assert_eq!(line.total_price, Price::new(14.0));

        let line = spec("201").to_cart_item(&catalog).unwrap();
        assert_eq!(line.size.as_deref(), Some("Regular"));
        assert_eq!(line.total_price, Price::new(5.0));

        let err = spec("201:Huge").to_cart_item(&catalog).unwrap_err();
        assert_eq!(err.to_string(), "Quarter Pounder does not come in size 'Huge'. Sizes: Regular, Large");
        assert!(spec("999").to_cart_item(&catalog).is_err());
        assert!(spec("201+Pickles").to_cart_item(&catalog).is_err());
    }
}
