//! # Map/List Presentation
//!
//! Presentation state for the map pins and the sidebar list, owned by one
//! [`MapController`]. A frontend mirrors this state; it never keeps its own.
//!
//! ## Highlight
//!
//! At most one place is active. Its marker uses [`IconStyle::Highlighted`] and
//! its listing row is marked active. Clicking the marker or the row of an
//! inactive place activates it (clearing the previous one first), clicking the
//! active one again, clicking the map background or filtering it out clears
//! it.
//!
//! ## Filter
//!
//! A neighborhood filter hides non-matching rows, takes non-matching markers
//! off the map and centers the view on the mean position of what is left, or
//! on the default city view when nothing is left. Applying the same filter
//! twice changes nothing.
//!
//! ## Details
//!
//! Rating and opening hours are fetched on demand through
//! [`MapController::fetch_details`], for any place and not only the ones that
//! needed geocoding. The geocoder caches them per name.
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::{
    config::MapConfig,
    geocode::{Geocoder, PlaceDetails, PlaceProvider},
    merge::Directory,
    place::{Coordinates, Place, normalize_label},
};

pub const ALL: &str = "all";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconStyle {
    Standard,
    Highlighted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub position: Coordinates,
    pub icon: IconStyle,
    pub on_map: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    pub number: usize,
    pub hidden: bool,
    pub active: bool,
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub place: Place,
    pub marker: Marker,
    pub listing: Listing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Neighborhood(String),
}

impl Filter {
    /// `"all"` (any case) or a blank value selects everything.
    pub fn parse(value: &str) -> Self {
        let value = normalize_label(value);

        if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
            Filter::All
        } else {
            Filter::Neighborhood(value)
        }
    }

    pub fn matches(&self, place: &Place) -> bool {
        match self {
            Filter::All => true,
            Filter::Neighborhood(neighborhood) => place.in_neighborhood(neighborhood),
        }
    }
}

/// Outcome of a click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The named place is now active. After a marker click its listing row
    /// should be scrolled into view.
    Highlighted(String),
    Cleared(String),
    Unchanged,
}

pub struct MapController {
    config: MapConfig,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    filter: Filter,
    active: Option<usize>,
    view: MapView,
}

impl MapController {
    pub fn new(config: MapConfig, directory: Directory) -> Self {
        let entries: Vec<Entry> = directory
            .into_places()
            .into_iter()
            .enumerate()
            .map(|(i, place)| {
                let position = place.coordinates.unwrap_or_else(|| {
                    warn!("No valid coordinates for {}, drawn at the default center", place.name);
                    config.center
                });

                Entry {
                    place,
                    marker: Marker {
                        position,
                        icon: IconStyle::Standard,
                        on_map: true,
                    },
                    listing: Listing {
                        number: i + 1,
                        hidden: false,
                        active: false,
                    },
                }
            })
            .collect();

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.place.name.clone(), i))
            .collect();

        let view = MapView {
            center: config.center,
            zoom: config.starting_zoom,
        };

        Self {
            config,
            entries,
            index,
            filter: Filter::All,
            active: None,
            view,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn visible(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| entry.marker.on_map)
    }

    pub fn active(&self) -> Option<&Entry> {
        self.active.map(|i| &self.entries[i])
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    /// Unique non-empty neighborhoods, sorted, for the filter dropdown.
    pub fn neighborhoods(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.place.neighborhood.as_str())
            .filter(|neighborhood| !neighborhood.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        for entry in &mut self.entries {
            let matches = filter.matches(&entry.place);
            entry.listing.hidden = !matches;
            entry.marker.on_map = matches;
        }

        if let Some(i) = self.active {
            if self.entries[i].marker.on_map {
                self.activate(i);
            } else {
                self.clear_active();
            }
        }

        let zoom = match filter {
            Filter::All => self.config.starting_zoom,
            Filter::Neighborhood(_) => self.config.neighborhood_zoom,
        };

        let centroid = Coordinates::centroid(self.visible().map(|entry| &entry.marker.position));

        self.view = match centroid {
            Some(center) => MapView { center, zoom },
            None => MapView {
                center: self.config.center,
                zoom: self.config.starting_zoom,
            },
        };

        self.filter = filter;
    }

    pub fn click_marker(&mut self, name: &str) -> Selection {
        match self.index.get(name).copied() {
            Some(i) if self.entries[i].marker.on_map => self.toggle(i),
            _ => Selection::Unchanged,
        }
    }

    /// Switches the filter to the place's neighborhood when the current one
    /// hides it. Otherwise pans to the place once it is highlighted.
    pub fn click_listing(&mut self, name: &str) -> Selection {
        let Some(i) = self.index.get(name).copied() else {
            return Selection::Unchanged;
        };

        let switch = !self.filter.matches(&self.entries[i].place);
        if switch {
            let filter = Filter::parse(&self.entries[i].place.neighborhood);
            debug!("Switching filter to {filter:?} for {name}");
            self.set_filter(filter);
        }

        let selection = self.toggle(i);

        if matches!(selection, Selection::Highlighted(_)) && !switch {
            self.view = MapView {
                center: self.entries[i].marker.position,
                zoom: self.view.zoom.max(self.config.focus_zoom),
            };
        }

        selection
    }

    pub fn click_background(&mut self) -> Selection {
        match self.clear_active() {
            Some(i) => Selection::Cleared(self.entries[i].place.name.clone()),
            None => Selection::Unchanged,
        }
    }

    /// Moves a marker once its coordinates are known.
    pub fn resolve(&mut self, name: &str, coordinates: Coordinates) -> bool {
        let Some(&i) = self.index.get(name) else {
            warn!("Cannot resolve unknown restaurant {name}");
            return false;
        };

        let entry = &mut self.entries[i];
        entry.place.coordinates = Some(coordinates);
        entry.marker.position = coordinates;
        true
    }

    /// Provider details for `name`, fetched once and kept on the entry. `None`
    /// when the name is unknown or the lookup failed.
    pub async fn fetch_details<P: PlaceProvider>(
        &mut self,
        geocoder: &mut Geocoder<P>,
        name: &str,
    ) -> Option<&PlaceDetails> {
        let i = *self.index.get(name)?;

        if self.entries[i].place.details.is_none() {
            let address = self.entries[i].place.address.clone();
            let details = geocoder.lookup(name, &address).await?;
            self.attach(i, details);
        }

        self.entries[i].place.details.as_ref()
    }

    /// Stores details on the entry. Coordinates from the sheet are kept, the
    /// provider's location only fills a missing one.
    pub fn attach_details(&mut self, name: &str, details: PlaceDetails) -> bool {
        let Some(&i) = self.index.get(name) else {
            warn!("Cannot attach details to unknown restaurant {name}");
            return false;
        };

        self.attach(i, details);
        true
    }

    fn attach(&mut self, i: usize, details: PlaceDetails) {
        let Entry { place, marker, .. } = &mut self.entries[i];

        if place.coordinates.is_none() {
            if let Some(coordinates) = details.coordinates() {
                place.coordinates = Some(coordinates);
                marker.position = coordinates;
            }
        }

        if place.address.is_empty() {
            place.address = details.formatted_address.clone().unwrap_or_default();
        }

        if place.map_uri.is_empty() {
            place.map_uri = details.google_maps_uri.clone().unwrap_or_default();
        }

        place.details = Some(details);
    }

    fn toggle(&mut self, i: usize) -> Selection {
        let name = self.entries[i].place.name.clone();

        if self.active == Some(i) {
            self.clear_active();
            return Selection::Cleared(name);
        }

        self.clear_active();
        self.activate(i);
        Selection::Highlighted(name)
    }

    fn activate(&mut self, i: usize) {
        let entry = &mut self.entries[i];
        entry.marker.icon = IconStyle::Highlighted;
        entry.listing.active = true;
        self.active = Some(i);
    }

    fn clear_active(&mut self) -> Option<usize> {
        let i = self.active.take()?;
        let entry = &mut self.entries[i];
        entry.marker.icon = IconStyle::Standard;
        entry.listing.active = false;
        Some(i)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Weekday;

    use super::*;
    use crate::{
        config::LA_CENTER,
        geocode::tests::FakeProvider,
        loader::Record,
        view::{OpeningHoursView, RatingView},
    };

    fn controller() -> MapController {
        let rows = [
            ("Akuma", "West Hollywood", "34.09,-118.38"),
            ("Employees Only", "West Hollywood", "34.07,-118.36"),
            ("Badmaash", "Downtown", "34.05,-118.25"),
            ("Lost Pin", "Downtown", ""),
            ("No Hood", "", "34.10,-118.30"),
        ];

        let records: Vec<Record> = rows
            .iter()
            .map(|(name, hood, coordinates)| {
                Record::from_pairs([
                    ("Name", *name),
                    ("neighborhood", *hood),
                    ("coordinates", *coordinates),
                ])
            })
            .collect();

        MapController::new(MapConfig::default(), Directory::from_records(&records))
    }

    fn highlighted(controller: &MapController) -> Vec<&str> {
        controller
            .entries()
            .iter()
            .filter(|entry| entry.marker.icon == IconStyle::Highlighted || entry.listing.active)
            .map(|entry| entry.place.name.as_str())
            .collect()
    }

    fn visible_names(controller: &MapController) -> Vec<&str> {
        controller.visible().map(|entry| entry.place.name.as_str()).collect()
    }

    fn assert_close(actual: Coordinates, lat: f64, lng: f64) {
        assert!((actual.lat - lat).abs() < 1e-9, "lat {} != {lat}", actual.lat);
        assert!((actual.lng - lng).abs() < 1e-9, "lng {} != {lng}", actual.lng);
    }

    #[test]
    fn test_every_place_gets_marker_and_listing() {
        let controller = controller();

        assert_eq!(controller.entries().len(), 5);
        assert_eq!(controller.entry("Lost Pin").unwrap().marker.position, LA_CENTER);
        assert_eq!(
            controller.entry("Akuma").unwrap().marker.position,
            Coordinates { lat: 34.09, lng: -118.38 }
        );
        assert_eq!(controller.entry("No Hood").unwrap().listing.number, 5);
        assert_eq!(controller.view().center, LA_CENTER);
        assert_eq!(controller.view().zoom, 12);
    }

    #[test]
    fn test_neighborhoods() {
        assert_eq!(controller().neighborhoods(), vec!["Downtown", "West Hollywood"]);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(Filter::parse("all"), Filter::All);
        assert_eq!(Filter::parse("ALL"), Filter::All);
        assert_eq!(Filter::parse(" "), Filter::All);
        assert_eq!(
            Filter::parse(" West  Hollywood"),
            Filter::Neighborhood("West Hollywood".to_string())
        );
    }

    #[test]
    fn test_filter_shows_exact_subset_and_centers() {
        let mut controller = controller();

        controller.set_filter(Filter::parse("West Hollywood"));

        assert_eq!(visible_names(&controller), vec!["Akuma", "Employees Only"]);
        assert!(controller.entry("Badmaash").unwrap().listing.hidden);
        assert!(!controller.entry("Akuma").unwrap().listing.hidden);
        assert_close(controller.view().center, 34.08, -118.37);
        assert_eq!(controller.view().zoom, 13);
    }

    #[test]
    fn test_filter_all_restores_everything() {
        let mut controller = controller();
        controller.set_filter(Filter::parse("Downtown"));

        controller.set_filter(Filter::All);

        assert_eq!(visible_names(&controller).len(), 5);
        assert!(controller.entries().iter().all(|entry| !entry.listing.hidden));
        assert_eq!(controller.view().zoom, 12);
    }

    #[test]
    fn test_filter_includes_default_center_pins() {
        let mut controller = controller();

        controller.set_filter(Filter::parse("Downtown"));

        assert_eq!(visible_names(&controller), vec!["Badmaash", "Lost Pin"]);
        assert_close(
            controller.view().center,
            (34.05 + LA_CENTER.lat) / 2.0,
            (-118.25 + LA_CENTER.lng) / 2.0,
        );
    }

    #[test]
    fn test_empty_filter_resets_view() {
        let mut controller = controller();

        controller.set_filter(Filter::parse("Koreatown"));

        assert_eq!(visible_names(&controller).len(), 0);
        assert_eq!(
            controller.view(),
            MapView {
                center: LA_CENTER,
                zoom: 12
            }
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut controller = controller();
        controller.click_marker("Akuma");
        controller.set_filter(Filter::parse("West Hollywood"));
        let view = controller.view();
        let visible: Vec<String> =
            visible_names(&controller).iter().map(|s| s.to_string()).collect();

        controller.set_filter(Filter::parse("West Hollywood"));

        assert_eq!(controller.view(), view);
        assert_eq!(visible_names(&controller), visible);
        assert_eq!(highlighted(&controller), vec!["Akuma"]);
    }

    #[test]
    fn test_marker_click_highlights_one() {
        let mut controller = controller();

        assert_eq!(controller.click_marker("Akuma"), Selection::Highlighted("Akuma".to_string()));
        assert_eq!(
            controller.click_marker("Badmaash"),
            Selection::Highlighted("Badmaash".to_string())
        );

        assert_eq!(highlighted(&controller), vec!["Badmaash"]);
        assert_eq!(controller.entry("Akuma").unwrap().marker.icon, IconStyle::Standard);
        assert!(!controller.entry("Akuma").unwrap().listing.active);
        assert_eq!(controller.active().unwrap().place.name, "Badmaash");
    }

    #[test]
    fn test_second_click_clears() {
        let mut controller = controller();
        controller.click_listing("Akuma");

        assert_eq!(controller.click_marker("Akuma"), Selection::Cleared("Akuma".to_string()));
        assert!(highlighted(&controller).is_empty());
        assert!(controller.active().is_none());
    }

    #[test]
    fn test_background_click_clears() {
        let mut controller = controller();
        assert_eq!(controller.click_background(), Selection::Unchanged);

        controller.click_marker("Akuma");

        assert_eq!(controller.click_background(), Selection::Cleared("Akuma".to_string()));
        assert!(highlighted(&controller).is_empty());
    }

    #[test]
    fn test_filter_clears_hidden_highlight() {
        let mut controller = controller();
        controller.click_marker("Badmaash");

        controller.set_filter(Filter::parse("West Hollywood"));

        assert!(controller.active().is_none());
        assert!(highlighted(&controller).is_empty());
    }

    #[test]
    fn test_filter_keeps_visible_highlight() {
        let mut controller = controller();
        controller.click_marker("Akuma");

        controller.set_filter(Filter::parse("West Hollywood"));

        assert_eq!(controller.active().unwrap().place.name, "Akuma");
        assert_eq!(controller.entry("Akuma").unwrap().marker.icon, IconStyle::Highlighted);
    }

    #[test]
    fn test_listing_click_pans_to_place() {
        let mut controller = controller();

        controller.click_listing("Akuma");

        assert_eq!(
            controller.view(),
            MapView {
                center: Coordinates { lat: 34.09, lng: -118.38 },
                zoom: 16
            }
        );
    }

    #[test]
    fn test_listing_click_switches_filter() {
        let mut controller = controller();
        controller.set_filter(Filter::parse("West Hollywood"));

        let selection = controller.click_listing("Badmaash");

        assert_eq!(selection, Selection::Highlighted("Badmaash".to_string()));
        assert_eq!(controller.filter(), &Filter::Neighborhood("Downtown".to_string()));
        assert!(controller.entry("Akuma").unwrap().listing.hidden);
        assert_eq!(visible_names(&controller), vec!["Badmaash", "Lost Pin"]);
        assert_close(
            controller.view().center,
            (34.05 + LA_CENTER.lat) / 2.0,
            (-118.25 + LA_CENTER.lng) / 2.0,
        );
    }

    #[test]
    fn test_listing_click_without_neighborhood_shows_all() {
        let mut controller = controller();
        controller.set_filter(Filter::parse("Downtown"));

        let selection = controller.click_listing("No Hood");

        assert_eq!(selection, Selection::Highlighted("No Hood".to_string()));
        assert_eq!(controller.filter(), &Filter::All);
        assert_eq!(visible_names(&controller).len(), 5);
        assert_eq!(highlighted(&controller), vec!["No Hood"]);
        assert_eq!(controller.view().zoom, 12);
    }

    #[test]
    fn test_hidden_marker_click_is_ignored() {
        let mut controller = controller();
        controller.set_filter(Filter::parse("Downtown"));

        assert_eq!(controller.click_marker("Akuma"), Selection::Unchanged);
        assert_eq!(controller.click_marker("Unknown"), Selection::Unchanged);
    }

    #[test]
    fn test_resolve_moves_marker() {
        let mut controller = controller();
        let resolved = Coordinates { lat: 34.04, lng: -118.26 };

        assert!(controller.resolve("Lost Pin", resolved));
        assert!(!controller.resolve("Unknown", resolved));

        let entry = controller.entry("Lost Pin").unwrap();
        assert_eq!(entry.marker.position, resolved);
        assert_eq!(entry.place.coordinates, Some(resolved));
    }

    #[tokio::test]
    async fn test_details_for_place_with_coordinates() {
        let mut controller = controller();
        let mut provider =
            FakeProvider::default().with_place("Akuma, Los Angeles", "akuma", 34.1, -118.4);
        provider.details.get_mut("akuma").unwrap().rating = Some(4.6);
        let mut geocoder = Geocoder::new(provider, "Los Angeles");

        controller.click_listing("Akuma");
        let fetched = controller.fetch_details(&mut geocoder, "Akuma").await.unwrap();

        assert_eq!(RatingView::new(fetched).value, "4.6");
        assert_eq!(
            OpeningHoursView::new(fetched.current_opening_hours.as_ref(), Weekday::Mon),
            OpeningHoursView::Unavailable
        );

        let entry = controller.entry("Akuma").unwrap();
        assert!(entry.place.details.is_some());
        assert_eq!(entry.place.address, "akuma address");
        assert_eq!(entry.marker.position, Coordinates { lat: 34.09, lng: -118.38 });
        assert_eq!(geocoder.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_details_are_fetched_once() {
        let mut controller = controller();
        let provider =
            FakeProvider::default().with_place("Akuma, Los Angeles", "akuma", 34.1, -118.4);
        let mut geocoder = Geocoder::new(provider, "Los Angeles");

        controller.fetch_details(&mut geocoder, "Akuma").await;
        controller.fetch_details(&mut geocoder, "Akuma").await;

        assert_eq!(geocoder.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_details_fill_missing_position() {
        let mut controller = controller();
        let provider =
            FakeProvider::default().with_place("Lost Pin, Los Angeles", "pin", 34.04, -118.26);
        let mut geocoder = Geocoder::new(provider, "Los Angeles");

        assert!(controller.fetch_details(&mut geocoder, "Lost Pin").await.is_some());
        assert!(controller.fetch_details(&mut geocoder, "Nowhere").await.is_none());

        assert_eq!(
            controller.entry("Lost Pin").unwrap().marker.position,
            Coordinates { lat: 34.04, lng: -118.26 }
        );
    }

    #[test]
    fn test_attach_details() {
        let mut controller = controller();
        let details = PlaceDetails {
            rating: Some(4.0),
            ..Default::default()
        };

        assert!(controller.attach_details("Badmaash", details.clone()));
        assert!(!controller.attach_details("Unknown", details));
        assert_eq!(
            controller.entry("Badmaash").unwrap().place.details.as_ref().unwrap().rating,
            Some(4.0)
        );
    }
}
