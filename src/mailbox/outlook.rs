//! Outlook backend: COM late binding against `Outlook.Application`.
//!
//! Every call goes through `IDispatch` by member name, the same object model
//! VBA macros see. One [`OutlookClient`] per thread; the COM apartment is
//! entered on [`OutlookClient::connect`] and left when the client drops.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use windows::core::{Interface, BSTR, GUID, HSTRING, IUnknown, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, CoUninitialize, IDispatch,
    CLSCTX_LOCAL_SERVER, COINIT_APARTMENTTHREADED, DISPATCH_FLAGS, DISPATCH_METHOD,
    DISPATCH_PROPERTYGET, DISPPARAMS,
};

use crate::error::{PstError, Result};
use crate::model::address::EmailAddress;
use crate::model::attachment::Attachment;
use crate::model::message::Message;

use super::{MailClient, MailFolder};

/// `OlObjectClass.olMail`
const OL_MAIL: i32 = 43;
/// `OlMailRecipientType.olTo`
const OL_TO: i32 = 1;
/// `OlMailRecipientType.olCC`
const OL_CC: i32 = 2;
/// `LOCALE_USER_DEFAULT`
const LOCALE_USER_DEFAULT: u32 = 0x0400;

// ── Dispatch helper ─────────────────────────────────────────────

/// An automation object addressed by member name.
#[derive(Clone)]
struct Dispatch(IDispatch);

impl Dispatch {
    fn invoke(&self, member: &str, mut args: Vec<VARIANT>) -> Result<VARIANT> {
        let name = HSTRING::from(member);
        let mut dispid = 0i32;
        unsafe {
            self.0.GetIDsOfNames(
                &GUID::zeroed(),
                &PCWSTR(name.as_ptr()),
                1,
                LOCALE_USER_DEFAULT,
                &mut dispid,
            )
        }
        .map_err(|e| PstError::automation(member, e))?;

        // IDispatch takes arguments last-to-first
        args.reverse();
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: std::ptr::null_mut(),
            cArgs: args.len() as u32,
            cNamedArgs: 0,
        };

        let mut result = VARIANT::default();
        unsafe {
            self.0.Invoke(
                dispid,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                DISPATCH_FLAGS(DISPATCH_METHOD.0 | DISPATCH_PROPERTYGET.0),
                &params,
                Some(&mut result as *mut VARIANT),
                None,
                None,
            )
        }
        .map_err(|e| PstError::automation(member, e))?;
        Ok(result)
    }

    fn get(&self, member: &str) -> Result<VARIANT> {
        self.invoke(member, Vec::new())
    }

    fn object(&self, member: &str) -> Result<Dispatch> {
        to_dispatch(member, &self.get(member)?)
    }

    fn string(&self, member: &str) -> Result<String> {
        let value = self.get(member)?;
        if value.is_empty() {
            return Ok(String::new());
        }
        BSTR::try_from(&value)
            .map(|s| s.to_string())
            .map_err(|e| PstError::automation(member, e))
    }

    /// String property, empty when the member is missing or fails.
    fn string_or_empty(&self, member: &str) -> String {
        self.string(member).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Property unavailable");
            String::new()
        })
    }

    fn int(&self, member: &str) -> Result<i32> {
        i32::try_from(&self.get(member)?).map_err(|e| PstError::automation(member, e))
    }

    /// `Count` of a 1-based collection.
    fn count(&self) -> Result<usize> {
        Ok(self.int("Count")?.max(0) as usize)
    }

    /// `Item(index)` of a 1-based collection.
    fn item(&self, index: usize) -> Result<Dispatch> {
        let member = format!("Item({index})");
        let value = self.invoke("Item", vec![VARIANT::from(index as i32)])?;
        to_dispatch(&member, &value)
    }
}

fn to_dispatch(member: &str, value: &VARIANT) -> Result<Dispatch> {
    let unknown = IUnknown::try_from(value).map_err(|e| PstError::automation(member, e))?;
    unknown
        .cast::<IDispatch>()
        .map(Dispatch)
        .map_err(|e| PstError::automation(member, e))
}

fn bstr_arg(value: &str) -> VARIANT {
    VARIANT::from(BSTR::from(value))
}

/// OLE automation dates count days from 1899-12-30; the fraction is the
/// time of day.
fn ole_date(days: f64) -> Option<NaiveDateTime> {
    // Outlook reports "no date" as 4501-01-01
    if !days.is_finite() || days <= 0.0 || days >= 949_998.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (days * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

// ── COM apartment ───────────────────────────────────────────────

/// Keeps COM initialised on the current thread.
struct ComApartment;

impl ComApartment {
    fn enter() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| PstError::MailClientUnavailable(format!("COM initialisation failed: {e}")))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

// ── Client ──────────────────────────────────────────────────────

/// A session with the locally installed Outlook.
pub struct OutlookClient {
    namespace: Dispatch,
    _application: Dispatch,
    // Dropped last: leaves the apartment after all interfaces are released
    _apartment: ComApartment,
}

impl OutlookClient {
    /// Start or attach to Outlook and open its MAPI namespace.
    pub fn connect() -> Result<Self> {
        let apartment = ComApartment::enter()?;

        let prog_id = HSTRING::from("Outlook.Application");
        let clsid = unsafe { CLSIDFromProgID(&prog_id) }
            .map_err(|e| PstError::MailClientUnavailable(format!("Outlook is not installed: {e}")))?;

        let application: IDispatch =
            unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }.map_err(|e| {
                PstError::MailClientUnavailable(format!("Could not start Outlook: {e}"))
            })?;
        let application = Dispatch(application);

        let namespace = application
            .invoke("GetNamespace", vec![bstr_arg("MAPI")])
            .and_then(|v| to_dispatch("GetNamespace", &v))
            .map_err(|e| PstError::MailClientUnavailable(e.to_string()))?;

        tracing::debug!("Connected to Outlook");
        Ok(Self {
            namespace,
            _application: application,
            _apartment: apartment,
        })
    }

    /// Find the top-level folder whose store file is `path`.
    fn find_store_root(&self, path: &Path) -> Result<Option<Dispatch>> {
        let folders = self.namespace.object("Folders")?;
        let count = folders.count()?;
        let wanted = normalize(path);

        let mut last = None;
        for i in 1..=count {
            let folder = match folders.item(i) {
                Ok(f) => f,
                Err(e) => {
                    tracing::debug!(index = i, error = %e, "Skipping top-level folder");
                    continue;
                }
            };
            let store_path = folder
                .object("Store")
                .and_then(|store| store.string("FilePath"))
                .unwrap_or_default();
            if !store_path.is_empty() && normalize(Path::new(&store_path)) == wanted {
                return Ok(Some(folder));
            }
            last = Some(folder);
        }

        // A freshly added store is appended last
        if last.is_some() {
            tracing::warn!(pst = %path.display(), "Store path not matched, using last folder");
        }
        Ok(last)
    }
}

/// Compare store paths the way Windows does: absolute and case-insensitive.
fn normalize(path: &Path) -> String {
    let absolute: PathBuf = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    absolute
        .to_string_lossy()
        .trim_start_matches(r"\\?\")
        .to_lowercase()
}

impl MailClient for OutlookClient {
    fn open_store(&self, path: &Path) -> Result<Box<dyn MailFolder>> {
        let display = path.to_string_lossy().into_owned();
        self.namespace
            .invoke("AddStore", vec![bstr_arg(&display)])
            .map_err(|e| PstError::StoreOpen {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let root = self
            .find_store_root(path)?
            .ok_or_else(|| PstError::StoreNotFound(path.to_path_buf()))?;
        Ok(Box::new(OutlookFolder::new(root)))
    }

    fn close_store(&self, root: &dyn MailFolder) -> Result<()> {
        let Some(folder) = root.as_any().downcast_ref::<OutlookFolder>() else {
            return Err(PstError::automation("RemoveStore", "not an Outlook folder"));
        };
        let unknown: IUnknown = folder
            .folder
            .0
            .cast()
            .map_err(|e| PstError::automation("RemoveStore", e))?;
        self.namespace
            .invoke("RemoveStore", vec![VARIANT::from(unknown)])
            .map(|_| ())
    }
}

// ── Folders and items ───────────────────────────────────────────

struct OutlookFolder {
    folder: Dispatch,
    items: OnceCell<Dispatch>,
}

impl OutlookFolder {
    fn new(folder: Dispatch) -> Self {
        Self {
            folder,
            items: OnceCell::new(),
        }
    }

    /// The `Items` collection, fetched once per folder.
    fn items(&self) -> Result<&Dispatch> {
        if let Some(items) = self.items.get() {
            return Ok(items);
        }
        let items = self.folder.object("Items")?;
        Ok(self.items.get_or_init(|| items))
    }
}

impl MailFolder for OutlookFolder {
    fn name(&self) -> String {
        self.folder.string_or_empty("Name")
    }

    fn item_count(&self) -> Result<usize> {
        self.items()?.count()
    }

    fn read_item(&self, index: usize) -> Result<Option<Message>> {
        let item = self.items()?.item(index + 1)?;
        if item.int("Class")? != OL_MAIL {
            return Ok(None);
        }
        read_mail(&item).map(Some)
    }

    fn subfolders(&self) -> Result<Vec<Box<dyn MailFolder>>> {
        let folders = self.folder.object("Folders")?;
        let count = folders.count()?;
        let mut result: Vec<Box<dyn MailFolder>> = Vec::with_capacity(count);
        for i in 1..=count {
            result.push(Box::new(OutlookFolder::new(folders.item(i)?)));
        }
        Ok(result)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn read_mail(item: &Dispatch) -> Result<Message> {
    let sender = EmailAddress::from_sender(
        item.string_or_empty("SenderName"),
        item.string_or_empty("SenderEmailAddress"),
        &item.string_or_empty("SenderEmailType"),
    );

    let received = item
        .get("ReceivedTime")
        .ok()
        .and_then(|v| f64::try_from(&v).ok())
        .and_then(ole_date);

    let (to, cc) = read_recipients(item);

    Ok(Message {
        subject: item.string_or_empty("Subject"),
        sender,
        to,
        cc,
        received,
        html_body: item.string_or_empty("HTMLBody"),
        text_body: item.string_or_empty("Body"),
        attachments: read_attachments(item),
    })
}

/// Split the `Recipients` collection into To and CC. BCC is dropped.
fn read_recipients(item: &Dispatch) -> (Vec<EmailAddress>, Vec<EmailAddress>) {
    let mut to = Vec::new();
    let mut cc = Vec::new();

    let recipients = match item.object("Recipients") {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "No recipients");
            return (to, cc);
        }
    };

    for i in 1..=recipients.count().unwrap_or(0) {
        let Ok(recip) = recipients.item(i) else {
            continue;
        };
        let addr = EmailAddress::new(recip.string_or_empty("Name"), recip.string_or_empty("Address"));
        match recip.int("Type").unwrap_or(OL_TO) {
            OL_CC => cc.push(addr),
            OL_TO => to.push(addr),
            _ => {}
        }
    }

    (to, cc)
}

/// Save each attachment through Outlook into a scratch directory and read
/// it back. Attachments that fail are logged and left out.
fn read_attachments(item: &Dispatch) -> Vec<Attachment> {
    let mut result = Vec::new();

    let attachments = match item.object("Attachments") {
        Ok(a) => a,
        Err(e) => {
            tracing::debug!(error = %e, "No attachments");
            return result;
        }
    };
    let count = attachments.count().unwrap_or(0);
    if count == 0 {
        return result;
    }

    let scratch = match tempfile::Builder::new().prefix("pst2md").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not create scratch directory for attachments");
            return result;
        }
    };

    for i in 1..=count {
        let loaded = attachments.item(i).and_then(|att| {
            let filename = att.string_or_empty("FileName");
            let scratch_path = scratch.path().join(format!("attachment_{i}"));
            att.invoke(
                "SaveAsFile",
                vec![bstr_arg(&scratch_path.to_string_lossy())],
            )?;
            let data = std::fs::read(&scratch_path).map_err(|e| PstError::io(&scratch_path, e))?;
            Ok(Attachment::new(filename, data))
        });
        match loaded {
            Ok(att) => result.push(att),
            Err(e) => tracing::warn!(index = i, error = %e, "Failed to save attachment"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ole_date() {
        let dt = ole_date(45306.5).unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 12:00:00");
        assert!(ole_date(0.0).is_none());
        assert!(ole_date(949_998.0).is_none());
    }
}
