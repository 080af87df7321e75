//! Filtering and pagination shared by the list pages.

use crate::models::PetRow;

pub const ITEMS_PER_PAGE: u32 = 6;

#[derive(Debug, Default, Clone)]
pub struct PetListFilter {
    pub pet_type: Option<String>,
    pub pet_size: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl PetListFilter {
    pub fn matches(&self, pet: &PetRow) -> bool {
        let eq = |wanted: &Option<String>, actual: Option<&str>| match non_empty(wanted) {
            Some(wanted) => actual == Some(wanted),
            None => true,
        };
        if !eq(&self.pet_type, Some(pet.pet_type.as_str()))
            || !eq(&self.pet_size, pet.pet_size.as_deref())
            || !eq(&self.status, Some(pet.status.as_str()))
        {
            return false;
        }

        let Some(needle) = non_empty(&self.search).map(str::to_lowercase) else {
            return true;
        };
        [
            Some(pet.title.as_str()),
            Some(pet.description.as_str()),
            pet.address.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn apply<T>(&self, items: Vec<T>, pet_of: impl Fn(&T) -> &PetRow) -> Vec<T> {
        items.into_iter().filter(|item| self.matches(pet_of(item))).collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Where a 1-based page lands once clamped into `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
    pub total_items: usize,
    pub total_pages: u32,
}

impl PageWindow {
    pub fn new(total_items: usize, requested_page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_pages = (total_items as u64).div_ceil(per_page as u64).max(1) as u32;
        Self {
            page: requested_page.clamp(1, total_pages),
            per_page,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn prev_page(&self) -> u32 {
        self.page.saturating_sub(1).max(1)
    }

    pub fn next_page(&self) -> u32 {
        (self.page + 1).min(self.total_pages)
    }

    /// 1-based positions of the first and last item shown; `(0, 0)` when empty.
    pub fn shown_range(&self) -> (usize, usize) {
        if self.total_items == 0 {
            return (0, 0);
        }
        let first = self.offset() + 1;
        let last = (self.offset() + self.per_page as usize).min(self.total_items);
        (first, last)
    }

    pub fn pages(&self) -> Vec<u32> {
        (1..=self.total_pages).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let window = PageWindow::new(items.len(), page, per_page);
    let items = items
        .into_iter()
        .skip(window.offset())
        .take(window.per_page as usize)
        .collect();
    Page { items, window }
}

/// Query-string page numbers: anything unparsable or below 1 is page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(id: &str, title: &str, pet_type: &str, status: &str, address: Option<&str>) -> PetRow {
        PetRow {
            id: id.into(),
            user_id: "u1".into(),
            title: title.into(),
            description: "Visto cerca de la estación de tren".into(),
            pet_type: pet_type.into(),
            pet_size: Some("mediano".into()),
            pet_color: None,
            pet_gender: None,
            pet_age: None,
            image_url: None,
            additional_images: "[]".into(),
            latitude: None,
            longitude: None,
            address: address.map(str::to_string),
            status: status.into(),
            views: 0,
            created_at: "2024-05-01T10:00:00.000Z".into(),
            updated_at: "2024-05-01T10:00:00.000Z".into(),
        }
    }

    fn sample() -> Vec<PetRow> {
        vec![
            pet("a", "Perro negro", "perro", "activo", Some("Calle Mayor, Madrid")),
            pet("b", "Gata blanca", "gato", "inactivo", None),
            pet("c", "Perro pequeño", "perro", "encontrado", None),
            pet("d", "Conejo gris", "conejo", "activo", Some("Valencia")),
        ]
    }

    fn ids(items: &[PetRow]) -> Vec<&str> {
        items.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn status_filter_returns_exact_subset() {
        let filter = PetListFilter {
            status: Some("activo".into()),
            ..Default::default()
        };
        let result = filter.apply(sample(), |p| p);
        assert_eq!(ids(&result), vec!["a", "d"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_description_and_address() {
        let by_title = PetListFilter {
            search: Some("PERRO".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_title.apply(sample(), |p| p)), vec!["a", "c"]);

        let by_address = PetListFilter {
            search: Some("valencia".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_address.apply(sample(), |p| p)), vec!["d"]);

        let by_description = PetListFilter {
            search: Some("Estación".into()),
            ..Default::default()
        };
        assert_eq!(by_description.apply(sample(), |p| p).len(), 4);
    }

    #[test]
    fn filters_combine_and_blank_values_are_ignored() {
        let filter = PetListFilter {
            pet_type: Some("perro".into()),
            status: Some("  ".into()),
            pet_size: Some("mediano".into()),
            search: None,
        };
        assert_eq!(ids(&filter.apply(sample(), |p| p)), vec!["a", "c"]);
    }

    #[test]
    fn second_page_of_ten_returns_items_seven_to_ten() {
        let items: Vec<u32> = (1..=10).collect();
        let page = paginate(items, 2, 6);
        assert_eq!(page.items, vec![7, 8, 9, 10]);
        assert_eq!(page.window.total_pages, 2);
        assert_eq!(page.window.shown_range(), (7, 10));
        assert!(page.window.has_prev());
        assert!(!page.window.has_next());
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(paginate(items.clone(), 9, 6).items, vec![7, 8, 9, 10]);
        assert_eq!(paginate(items, 0, 6).items, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_list_has_one_empty_page() {
        let page = paginate(Vec::<u32>::new(), 3, 6);
        assert!(page.items.is_empty());
        assert_eq!(page.window.page, 1);
        assert_eq!(page.window.total_pages, 1);
        assert_eq!(page.window.shown_range(), (0, 0));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageWindow::new(12, 1, 6).total_pages, 2);
        assert_eq!(PageWindow::new(13, 1, 6).total_pages, 3);
        assert_eq!(PageWindow::new(1, 1, 10).total_pages, 1);
    }

    #[test]
    fn page_parameter_parsing() {
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(None), 1);
    }
}
