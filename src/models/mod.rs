pub mod pet_enums;
pub mod pets;
pub mod profiles;

pub use pet_enums::{PetAge, PetGender, PetSize, PetStatus, PetType};
pub use pets::{PetRow, PetWithOwnerRow, SimilarPetRow};
pub use profiles::ProfileRow;
