use std::path::PathBuf;

use hwprog_stream::{mirror_text, FormData};

pub(crate) const HW_SERVER_FIELD: &str = "hw_server";
pub(crate) const BINARY_MIME: &str = "application/octet-stream";

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FlashSteps {
    pub(crate) blank_check: bool,
    pub(crate) erase: bool,
    pub(crate) cfg_program: bool,
    pub(crate) verify: bool,
}

pub(crate) fn fpga_form(bitfile: PathBuf, ltxfile: Option<PathBuf>) -> FormData {
    let form = FormData::new().file_with_mime("bitfile", bitfile, BINARY_MIME);
    match ltxfile {
        Some(ltxfile) => form.file("ltxfile", ltxfile),
        None => form,
    }
}

pub(crate) fn flash_form(binfile: PathBuf, steps: FlashSteps) -> FormData {
    FormData::new()
        .file_with_mime("binfile", binfile, BINARY_MIME)
        .flag("blank_check", steps.blank_check)
        .flag("erase", steps.erase)
        .flag("cfg_program", steps.cfg_program)
        .flag("verify", steps.verify)
}

pub(crate) fn list_hw_form() -> FormData {
    FormData::new()
}

/// Copies the selected hardware server into each form.
pub(crate) fn select_server<'a>(forms: impl IntoIterator<Item = &'a mut FormData>, address: &str) {
    mirror_text(forms, HW_SERVER_FIELD, address);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_flash_steps_are_left_out() {
        let form = flash_form(
            "design.bin".into(),
            FlashSteps {
                erase: true,
                verify: true,
                ..FlashSteps::default()
            },
        );
        let names: Vec<_> = form.field_names().collect();
        assert_eq!(names, vec!["binfile", "erase", "verify"]);
        assert_eq!(form.get_text("erase"), Some("on"));
    }

    #[test]
    fn ltx_file_is_optional() {
        assert!(!fpga_form("top.bit".into(), None).has_field("ltxfile"));
        assert!(fpga_form("top.bit".into(), Some("top.ltx".into())).has_field("ltxfile"));
    }

    #[test]
    fn images_are_sent_as_binary() {
        let fpga = fpga_form("top.bit".into(), Some("top.ltx".into()));
        assert_eq!(fpga.file_mime("bitfile"), Some(BINARY_MIME));
        assert_eq!(fpga.file_mime("ltxfile"), None);

        let flash = flash_form("design.bin".into(), FlashSteps::default());
        assert_eq!(flash.file_mime("binfile"), Some(BINARY_MIME));
    }

    #[test]
    fn server_selection_reaches_every_form() {
        let mut fpga = fpga_form("top.bit".into(), None);
        let mut flash = flash_form("design.bin".into(), FlashSteps::default());
        let mut list = list_hw_form();
        select_server([&mut fpga, &mut flash, &mut list], "lab-1:3121");
        select_server([&mut fpga, &mut flash, &mut list], "lab-2:3121");

        for form in [&fpga, &flash, &list] {
            assert_eq!(form.get_text(HW_SERVER_FIELD), Some("lab-2:3121"));
            assert_eq!(
                form.field_names()
                    .filter(|name| *name == HW_SERVER_FIELD)
                    .count(),
                1
            );
        }
    }
}
