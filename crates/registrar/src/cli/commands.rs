//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::form::PersonForm;
use crate::photo::{CropBox, CropMode};
use crate::record::RecordId;
use crate::validation::Field;

/// Person field options shared by `register` and `edit`.
#[derive(Debug, Clone, Default, Args)]
pub struct PersonArgs {
    /// Given name
    #[arg(long)]
    pub given_name: Option<String>,

    /// Paternal surname
    #[arg(long)]
    pub paternal_surname: Option<String>,

    /// Maternal surname
    #[arg(long)]
    pub maternal_surname: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Birth date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub birth_date: Option<String>,

    /// Street
    #[arg(long)]
    pub street: Option<String>,

    /// Exterior number
    #[arg(long, value_name = "NUMBER")]
    pub exterior_number: Option<String>,

    /// Neighborhood
    #[arg(long)]
    pub neighborhood: Option<String>,

    /// Municipality or borough
    #[arg(long)]
    pub municipality: Option<String>,

    /// State
    #[arg(long)]
    pub state: Option<String>,

    /// Five-digit postal code
    #[arg(long, value_name = "CODE")]
    pub postal_code: Option<String>,
}

impl PersonArgs {
    /// The fields given on the command line, in form order.
    #[must_use]
    pub fn given(&self) -> Vec<(Field, &str)> {
        let values = [
            (Field::GivenName, &self.given_name),
            (Field::PaternalSurname, &self.paternal_surname),
            (Field::MaternalSurname, &self.maternal_surname),
            (Field::Email, &self.email),
            (Field::BirthDate, &self.birth_date),
            (Field::Street, &self.street),
            (Field::ExteriorNumber, &self.exterior_number),
            (Field::Neighborhood, &self.neighborhood),
            (Field::Municipality, &self.municipality),
            (Field::State, &self.state),
            (Field::PostalCode, &self.postal_code),
        ];
        values
            .into_iter()
            .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
            .collect()
    }

    /// Write the given fields into `form`, leaving the others untouched.
    pub fn apply_to(&self, form: &mut PersonForm) {
        for (field, value) in self.given() {
            form.set(field, value);
        }
    }
}

/// Photo options shared by `register` and `edit`.
#[derive(Debug, Clone, Default, Args)]
pub struct PhotoArgs {
    /// Image file used as the camera frame
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// How the selection becomes the square photo
    #[arg(long, value_enum, default_value = "auto")]
    pub crop: CropModeArg,

    /// Crop selection in source pixels (default: largest centred square)
    #[arg(long, value_name = "X,Y,W,H")]
    pub crop_box: Option<CropBox>,
}

/// Register command arguments.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Person fields
    #[command(flatten)]
    pub person: PersonArgs,

    /// Photo source and crop
    #[command(flatten)]
    pub photo: PhotoArgs,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Filter by paternal surname (substring, case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Record id
    pub id: RecordId,

    /// Fields to change
    #[command(flatten)]
    pub person: PersonArgs,

    /// Replacement photo
    #[command(flatten)]
    pub photo: PhotoArgs,
}

/// Browse command arguments.
#[derive(Debug, Args)]
pub struct BrowseCommand {
    /// Initial search term
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Camera commands.
#[derive(Debug, Subcommand)]
pub enum CameraCommand {
    /// Check whether a camera stream can be opened
    Check {
        /// Image file used as the camera frame
        #[arg(long, value_name = "FILE")]
        photo: Option<PathBuf>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Crop mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CropModeArg {
    /// Stretch the selection over the whole square
    #[default]
    Auto,
    /// Fit the selection inside the square with white padding
    Manual,
}

impl From<CropModeArg> for CropMode {
    fn from(arg: CropModeArg) -> Self {
        match arg {
            CropModeArg::Auto => Self::Auto,
            CropModeArg::Manual => Self::Manual,
        }
    }
}
