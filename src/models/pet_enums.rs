//! Closed value sets stored in the `pets` table.
//!
//! The stored values are the Spanish slugs used by the database `CHECK`
//! constraints; `label()` is what the pages show.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetType {
    Perro,
    Gato,
    Ave,
    Conejo,
    Otro,
}

impl PetType {
    pub const ALL: [PetType; 5] = [
        PetType::Perro,
        PetType::Gato,
        PetType::Ave,
        PetType::Conejo,
        PetType::Otro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PetType::Perro => "perro",
            PetType::Gato => "gato",
            PetType::Ave => "ave",
            PetType::Conejo => "conejo",
            PetType::Otro => "otro",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetType::Perro => "Perro",
            PetType::Gato => "Gato",
            PetType::Ave => "Ave",
            PetType::Conejo => "Conejo",
            PetType::Otro => "Otro",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == input.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetSize {
    Pequeno,
    Mediano,
    Grande,
}

impl PetSize {
    pub const ALL: [PetSize; 3] = [PetSize::Pequeno, PetSize::Mediano, PetSize::Grande];

    pub fn as_str(self) -> &'static str {
        match self {
            PetSize::Pequeno => "pequeño",
            PetSize::Mediano => "mediano",
            PetSize::Grande => "grande",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetSize::Pequeno => "Pequeño",
            PetSize::Mediano => "Mediano",
            PetSize::Grande => "Grande",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == input.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetGender {
    Macho,
    Hembra,
    Desconocido,
}

impl PetGender {
    pub const ALL: [PetGender; 3] = [PetGender::Macho, PetGender::Hembra, PetGender::Desconocido];

    pub fn as_str(self) -> &'static str {
        match self {
            PetGender::Macho => "macho",
            PetGender::Hembra => "hembra",
            PetGender::Desconocido => "desconocido",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetGender::Macho => "Macho",
            PetGender::Hembra => "Hembra",
            PetGender::Desconocido => "Desconocido",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == input.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetAge {
    Cachorro,
    Joven,
    Adulto,
    Senior,
    Desconocido,
}

impl PetAge {
    pub const ALL: [PetAge; 5] = [
        PetAge::Cachorro,
        PetAge::Joven,
        PetAge::Adulto,
        PetAge::Senior,
        PetAge::Desconocido,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PetAge::Cachorro => "cachorro",
            PetAge::Joven => "joven",
            PetAge::Adulto => "adulto",
            PetAge::Senior => "senior",
            PetAge::Desconocido => "desconocido",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetAge::Cachorro => "Cachorro",
            PetAge::Joven => "Joven",
            PetAge::Adulto => "Adulto",
            PetAge::Senior => "Senior",
            PetAge::Desconocido => "Desconocido",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == input.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetStatus {
    Activo,
    Inactivo,
    Encontrado,
    Adoptado,
}

impl PetStatus {
    pub const ALL: [PetStatus; 4] = [
        PetStatus::Activo,
        PetStatus::Inactivo,
        PetStatus::Encontrado,
        PetStatus::Adoptado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PetStatus::Activo => "activo",
            PetStatus::Inactivo => "inactivo",
            PetStatus::Encontrado => "encontrado",
            PetStatus::Adoptado => "adoptado",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetStatus::Activo => "Activo",
            PetStatus::Inactivo => "Inactivo",
            PetStatus::Encontrado => "Encontrado",
            PetStatus::Adoptado => "Adoptado",
        }
    }

    /// CSS modifier for the status badge.
    pub fn badge(self) -> &'static str {
        match self {
            PetStatus::Activo => "success",
            PetStatus::Inactivo => "warning",
            PetStatus::Encontrado => "info",
            PetStatus::Adoptado => "secondary",
        }
    }

    /// Found or adopted: the posting no longer needs help.
    pub fn is_resolved(self) -> bool {
        matches!(self, PetStatus::Encontrado | PetStatus::Adoptado)
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == input.trim())
    }
}

const NOT_SPECIFIED: &str = "No especificado";

pub fn type_label(raw: &str) -> String {
    PetType::parse(raw)
        .map(|v| v.label().to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn size_label(raw: Option<&str>) -> String {
    optional_label(raw, |s| PetSize::parse(s).map(PetSize::label))
}

pub fn gender_label(raw: Option<&str>) -> String {
    optional_label(raw, |s| PetGender::parse(s).map(PetGender::label))
}

pub fn age_label(raw: Option<&str>) -> String {
    optional_label(raw, |s| PetAge::parse(s).map(PetAge::label))
}

pub fn status_label(raw: &str) -> String {
    PetStatus::parse(raw)
        .map(|v| v.label().to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn status_badge(raw: &str) -> &'static str {
    PetStatus::parse(raw).map(PetStatus::badge).unwrap_or("default")
}

fn optional_label(raw: Option<&str>, known: impl Fn(&str) -> Option<&'static str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NOT_SPECIFIED.to_string();
    };
    known(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
